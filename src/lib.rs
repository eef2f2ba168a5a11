// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # netpack
//!
//! Compact binary serialization for networked applications. `netpack` packs primitives,
//! fixed-size blobs, length-prefixed sequences and user-defined messages into a byte stream
//! with minimal overhead, and reconstructs them symmetrically on the other side.
//!
//! ## Features
//!
//! - **Growable write cursor** - doubles on demand up to a configured ceiling, never past it
//! - **Zero-copy read cursor** - borrow caller-owned bytes or own a copy
//! - **Batched bounds checks** - one check certifies a whole group of writes or reads, handed
//!   out as a capability token so the unchecked path cannot be reached without it
//! - **Bit contexts** - sub-byte writes and reads that always restore byte alignment on drop
//! - **Varint and zigzag** - small magnitudes in one byte, `u64::MAX` in nine
//! - **Bit-packed integers** - self-delimiting encodings with a fixed bit budget
//! - **Bidirectional contract** - describe a message once with [`NetworkSerialize`]
//!
//! ## Quick Start
//!
//! ```rust
//! use netpack::prelude::*;
//!
//! let mut writer = BufferWriter::with_config(WriterConfig::growable(16, 1024))?;
//! writer.write_value(&0x1234u16)?;
//! write_value_packed(&mut writer, &-1i64)?;
//! 300u32.write_bit_packed(&mut writer)?;
//!
//! let mut reader = BufferReader::from_writer(&writer);
//! assert_eq!(reader.read_value::<u16>()?, 0x1234);
//! assert_eq!(read_value_packed::<i64>(&mut reader)?, -1);
//! assert_eq!(u32::read_bit_packed(&mut reader)?, 300);
//! # Ok::<(), netpack::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`buffer`] - the byte cursors, their reservation tokens and bit contexts
//! - [`codec`] - varint, bit-packed and per-type packed encodings over the cursors
//! - [`serializer`] - the [`NetworkSerialize`] contract and [`BufferSerializer`] dispatch
//! - [`utils`] - minimal byte/bit counts and zigzag mapping
//!
//! ## Byte Order
//!
//! Fixed-width values are copied in native byte order. Reader and writer must therefore run on
//! machines with matching endianness. Varint and bit-packed payloads are little-endian.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. Failures are local and synchronous: a failed
//! single-call write or read leaves the cursor where it was. See [`Error`] for the taxonomy.
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade: buffer growth at `debug`,
//! bit context entry and exit at `trace`. No logger is installed by the library.

#[macro_use]
pub(crate) mod error;

/// Writer capacity configuration.
pub mod config;

/// Byte cursors, reservation tokens and bit contexts
///
/// # Key Types
///
/// - [`buffer::BufferWriter`] - growable write cursor
/// - [`buffer::BufferReader`] - bounds-checked read cursor
/// - [`buffer::WriteReservation`] / [`buffer::ReadReservation`] - batch-checked fast path
/// - [`buffer::BitWriter`] / [`buffer::BitReader`] - bit-granular sub-contexts
/// - [`buffer::Blittable`] - types that may be copied byte-for-byte
pub mod buffer;

/// Compact encodings: varint, bit-packed, and per-type packed dispatch
pub mod codec;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use netpack::prelude::*;
///
/// let mut writer = BufferWriter::new(8, 8)?;
/// write_value_packed(&mut writer, &2288u64)?;
/// assert_eq!(writer.length(), 3);
/// # Ok::<(), netpack::Error>(())
/// ```
pub mod prelude;

/// The bidirectional [`NetworkSerialize`] contract
pub mod serializer;

/// Minimal byte/bit counts and zigzag mapping
pub mod utils;

/// `netpack` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `netpack` Error type
///
/// Capacity, bounds, context, budget and decoding failures of every cursor and codec.
pub use error::Error;

/// Growable write cursor. See [`buffer::writer`].
pub use buffer::{BufferWriter, WriteReservation};

/// Read cursor. See [`buffer::reader`].
pub use buffer::{BufferReader, ReadReservation};

/// Bit-granular sub-contexts. See [`buffer::bitwriter`] and [`buffer::bitreader`].
pub use buffer::{BitReader, BitWriter};

/// Capacity settings for [`BufferWriter`].
pub use config::WriterConfig;

/// Serialization contract and dispatch.
pub use serializer::{BufferSerializer, NetworkSerialize, PreChecked};
