//! Pure helper functions shared by the codecs.
//!
//! - [`bitcounter`] - minimal byte/bit counts via De Bruijn lookup
//! - [`zigzag`] - signed to unsigned mapping that keeps small magnitudes small

pub mod bitcounter;
pub mod zigzag;

pub use bitcounter::{
    used_bit_count_u32, used_bit_count_u64, used_byte_count_u32, used_byte_count_u64,
};
pub use zigzag::ZigZag;
