//! Bidirectional serialization contract.
//!
//! A type implements [`NetworkSerialize`] once and gets both directions: the same
//! `network_serialize` body writes its fields when handed a writer and overwrites them when
//! handed a reader. [`BufferSerializer`] is the two-variant dispatch over the active cursor;
//! each `serialize_*` call either writes the referenced value or replaces it with what was read.
//!
//! # Examples
//!
//! ```rust
//! use netpack::prelude::*;
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Move {
//!     entity: u32,
//!     dx: i16,
//!     label: String,
//! }
//!
//! impl NetworkSerialize for Move {
//!     fn network_serialize(&mut self, s: &mut BufferSerializer<'_, '_>) -> netpack::Result<()> {
//!         s.serialize_packed(&mut self.entity)?;
//!         s.serialize_bit_packed(&mut self.dx)?;
//!         s.serialize_string(&mut self.label, true)
//!     }
//! }
//!
//! let mut writer = BufferWriter::new(16, 256)?;
//! let mut message = Move { entity: 9, dx: -4, label: "jump".into() };
//! writer.write_network_serializable(&mut message)?;
//!
//! let mut reader = BufferReader::from_writer(&writer);
//! assert_eq!(reader.read_network_serializable::<Move>()?, message);
//! # Ok::<(), netpack::Error>(())
//! ```

use crate::{
    buffer::{Blittable, ReadReservation, WriteReservation},
    codec::{BitPacked, Packed},
    BufferReader, BufferWriter, Result,
};

/// Types that describe their wire form once for both directions.
pub trait NetworkSerialize {
    /// Serializes `self` against the active cursor.
    ///
    /// When `serializer` is reading, every field passed to it is overwritten with the decoded
    /// value.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the cursor.
    fn network_serialize(&mut self, serializer: &mut BufferSerializer<'_, '_>) -> Result<()>;
}

/// The active cursor of a [`NetworkSerialize`] pass.
#[derive(Debug)]
pub enum BufferSerializer<'s, 'a> {
    /// Values are written
    Writer(&'s mut BufferWriter),
    /// Values are read and stored back into the referenced fields
    Reader(&'s mut BufferReader<'a>),
}

impl<'s, 'a> BufferSerializer<'s, 'a> {
    /// Returns `true` when values are being read.
    #[must_use]
    pub fn is_reader(&self) -> bool {
        matches!(self, BufferSerializer::Reader(_))
    }

    /// Returns `true` when values are being written.
    #[must_use]
    pub fn is_writer(&self) -> bool {
        matches!(self, BufferSerializer::Writer(_))
    }

    /// The underlying writer, for types that drive the cursor by hand.
    pub fn writer(&mut self) -> Option<&mut BufferWriter> {
        match self {
            BufferSerializer::Writer(writer) => Some(&mut **writer),
            BufferSerializer::Reader(_) => None,
        }
    }

    /// The underlying reader, for types that drive the cursor by hand.
    pub fn reader(&mut self) -> Option<&mut BufferReader<'a>> {
        match self {
            BufferSerializer::Writer(_) => None,
            BufferSerializer::Reader(reader) => Some(&mut **reader),
        }
    }

    /// Batched bounds check for `bytes` bytes in either direction.
    ///
    /// See [`BufferWriter::try_begin_write`] and [`BufferReader::try_begin_read`].
    #[must_use]
    pub fn pre_check(&mut self, bytes: usize) -> bool {
        match self {
            BufferSerializer::Writer(writer) => writer.try_begin_write(bytes),
            BufferSerializer::Reader(reader) => reader.try_begin_read(bytes),
        }
    }

    /// Batched bounds check returning a direction-aware token for `bytes` bytes.
    ///
    /// Fixed-width fields serialized through the returned [`PreChecked`] skip the per-call
    /// checks. See [`BufferWriter::reserve`] and [`BufferReader::begin_read`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CapacityExceeded`] or [`crate::Error::OutOfBounds`] if the
    /// bytes are not available, or [`crate::Error::BitwiseContextActive`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use netpack::{BufferSerializer, BufferWriter};
    ///
    /// let mut writer = BufferWriter::new(8, 8)?;
    /// let mut s = BufferSerializer::Writer(&mut writer);
    /// let mut batch = s.pre_check_reserve(3)?;
    /// batch.serialize_value(&mut 0x0102u16);
    /// batch.serialize_bool(&mut true)?;
    /// assert_eq!(batch.remaining(), 0);
    /// drop(batch);
    /// assert_eq!(writer.position(), 3);
    /// # Ok::<(), netpack::Error>(())
    /// ```
    pub fn pre_check_reserve(&mut self, bytes: usize) -> Result<PreChecked<'_, 'a>> {
        match self {
            BufferSerializer::Writer(writer) => Ok(PreChecked::Writer(writer.reserve(bytes)?)),
            BufferSerializer::Reader(reader) => Ok(PreChecked::Reader(reader.begin_read(bytes)?)),
        }
    }

    /// Serializes the raw in-memory representation of `value`.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the cursor.
    pub fn serialize_value<T: Blittable>(&mut self, value: &mut T) -> Result<()> {
        match self {
            BufferSerializer::Writer(writer) => writer.write_value(value),
            BufferSerializer::Reader(reader) => {
                *value = reader.read_value()?;
                Ok(())
            }
        }
    }

    /// Serializes a `bool` as one byte.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the cursor.
    pub fn serialize_bool(&mut self, value: &mut bool) -> Result<()> {
        match self {
            BufferSerializer::Writer(writer) => writer.write_bool(*value),
            BufferSerializer::Reader(reader) => {
                *value = reader.read_bool()?;
                Ok(())
            }
        }
    }

    /// Serializes a string in the fixed-width form of [`BufferWriter::write_string`].
    ///
    /// # Errors
    ///
    /// Returns any error raised by the cursor.
    pub fn serialize_string(&mut self, value: &mut String, one_byte_chars: bool) -> Result<()> {
        match self {
            BufferSerializer::Writer(writer) => writer.write_string(value, one_byte_chars),
            BufferSerializer::Reader(reader) => {
                *value = reader.read_string(one_byte_chars)?;
                Ok(())
            }
        }
    }

    /// Serializes a vector of raw values with a `u32` count prefix.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the cursor.
    pub fn serialize_vec<T: Blittable>(&mut self, value: &mut Vec<T>) -> Result<()> {
        match self {
            BufferSerializer::Writer(writer) => writer.write_slice(value),
            BufferSerializer::Reader(reader) => {
                *value = reader.read_vec()?;
                Ok(())
            }
        }
    }

    /// Serializes a value in its [`Packed`] form.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the cursor or codec.
    pub fn serialize_packed<T: Packed>(&mut self, value: &mut T) -> Result<()> {
        match self {
            BufferSerializer::Writer(writer) => value.write_packed(writer),
            BufferSerializer::Reader(reader) => {
                *value = T::read_packed(reader)?;
                Ok(())
            }
        }
    }

    /// Serializes an integer in its [`BitPacked`] form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::BitBudgetExceeded`] when writing a value outside the budget, or
    /// any error raised by the cursor.
    pub fn serialize_bit_packed<T: BitPacked>(&mut self, value: &mut T) -> Result<()> {
        match self {
            BufferSerializer::Writer(writer) => value.write_bit_packed(writer),
            BufferSerializer::Reader(reader) => {
                *value = T::read_bit_packed(reader)?;
                Ok(())
            }
        }
    }

    /// Serializes a nested [`NetworkSerialize`] value against the same cursor.
    ///
    /// # Errors
    ///
    /// Returns whatever the nested implementation returns.
    pub fn serialize_network<T: NetworkSerialize>(&mut self, value: &mut T) -> Result<()> {
        value.network_serialize(self)
    }
}

/// Token for fields whose bytes were verified by [`BufferSerializer::pre_check_reserve`].
///
/// Serializing past the verified window panics in every build configuration.
#[derive(Debug)]
pub enum PreChecked<'r, 'a> {
    /// Pre-checked writes
    Writer(WriteReservation<'r>),
    /// Pre-checked reads
    Reader(ReadReservation<'r, 'a>),
}

impl PreChecked<'_, '_> {
    /// Bytes left in the verified window.
    #[must_use]
    pub fn remaining(&self) -> usize {
        match self {
            PreChecked::Writer(batch) => batch.remaining(),
            PreChecked::Reader(batch) => batch.remaining(),
        }
    }

    /// Serializes the raw in-memory representation of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `T` does not fit the remaining window.
    pub fn serialize_value<T: Blittable>(&mut self, value: &mut T) {
        match self {
            PreChecked::Writer(batch) => batch.write_value(value),
            PreChecked::Reader(batch) => *value = batch.read_value(),
        }
    }

    /// Serializes a `bool` as one byte.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] when reading a byte other than `0` or `1`.
    ///
    /// # Panics
    ///
    /// Panics if the window is exhausted.
    pub fn serialize_bool(&mut self, value: &mut bool) -> Result<()> {
        match self {
            PreChecked::Writer(batch) => batch.write_bool(*value),
            PreChecked::Reader(batch) => *value = batch.read_bool()?,
        }
        Ok(())
    }

    /// Serializes `value.len()` raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if the bytes do not fit the remaining window.
    pub fn serialize_bytes(&mut self, value: &mut [u8]) {
        match self {
            PreChecked::Writer(batch) => batch.write_bytes(value),
            PreChecked::Reader(batch) => value.copy_from_slice(batch.read_bytes(value.len())),
        }
    }
}

impl BufferWriter {
    /// Writes `value` through its [`NetworkSerialize`] implementation.
    ///
    /// # Errors
    ///
    /// Returns whatever the implementation returns.
    pub fn write_network_serializable<T: NetworkSerialize>(&mut self, value: &mut T) -> Result<()> {
        value.network_serialize(&mut BufferSerializer::Writer(self))
    }
}

impl BufferReader<'_> {
    /// Reads a `T` by running its [`NetworkSerialize`] implementation against a default value.
    ///
    /// The read is transactional: on error the position is restored.
    ///
    /// # Errors
    ///
    /// Returns whatever the implementation returns.
    pub fn read_network_serializable<T: NetworkSerialize + Default>(&mut self) -> Result<T> {
        self.transactional(|reader| {
            let mut value = T::default();
            value.network_serialize(&mut BufferSerializer::Reader(reader))?;
            Ok(value)
        })
    }
}
