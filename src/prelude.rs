//! # netpack Prelude
//!
//! The types and traits needed for everyday serialization. Import with
//! `use netpack::prelude::*;`.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all netpack operations
pub use crate::Error;

/// The result type used throughout netpack
pub use crate::Result;

/// Writer capacity settings
pub use crate::WriterConfig;

// ================================================================================================
// Cursors
// ================================================================================================

/// Byte cursors and their batch-checked reservation tokens
pub use crate::buffer::{BufferReader, BufferWriter, ReadReservation, WriteReservation};

/// Bit-granular sub-contexts
pub use crate::buffer::{BitReader, BitWriter};

/// Marker for types that may be copied byte-for-byte
pub use crate::buffer::Blittable;

// ================================================================================================
// Codecs
// ================================================================================================

/// Per-type packed encodings
pub use crate::codec::{read_value_packed, write_str_packed, write_value_packed, Packed};

/// Bit-packed integers
pub use crate::codec::BitPacked;

// ================================================================================================
// Serialization Contract
// ================================================================================================

/// Bidirectional message description and dispatch
pub use crate::serializer::{BufferSerializer, NetworkSerialize, PreChecked};
