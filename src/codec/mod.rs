//! Compact integer and value encodings layered on the cursors.
//!
//! - [`varint`] - escape-byte variable-length integers, zigzag for signed values
//! - [`bitpack`] - self-delimiting integers with a fixed bit budget
//! - [`packed`] - per-type dispatch choosing the packed form of a value
//!
//! Every codec reserves or peeks the full extent of a value before touching the cursor, so a
//! failed encode or decode of a single value leaves the position where it was.

pub mod bitpack;
pub mod packed;
pub mod varint;

pub use bitpack::{
    BitPacked, BIT_PACKED_I16_MAX, BIT_PACKED_I16_MIN, BIT_PACKED_I32_MAX, BIT_PACKED_I32_MIN,
    BIT_PACKED_I64_MAX, BIT_PACKED_I64_MIN, BIT_PACKED_U16_MAX, BIT_PACKED_U32_MAX,
    BIT_PACKED_U64_MAX,
};
pub use packed::{read_value_packed, write_str_packed, write_value_packed, Packed};
