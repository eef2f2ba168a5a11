//! Escape-byte variable-length integers.
//!
//! | Value range | Bytes | Layout |
//! |-------------|-------|--------|
//! | `0..=240` | 1 | the value itself |
//! | `241..=2287` | 2 | `241 + ((v - 240) >> 8)`, then `(v - 240) & 0xFF` |
//! | `2288..` | 3-9 | `247 + n`, then the `n` minimal little-endian bytes of `v` |
//!
//! The first byte alone tells the decoder how many bytes follow, so the format is
//! self-delimiting. Signed values go through [`ZigZag`] first so small negative numbers stay
//! short.
//!
//! Note that a 16-bit value above 2287 costs three bytes, one more than a fixed-width write.
//!
//! # Examples
//!
//! ```rust
//! use netpack::{codec::varint, BufferReader, BufferWriter};
//!
//! let mut writer = BufferWriter::new(16, 16)?;
//! varint::write_u64_packed(&mut writer, 2288)?;
//! varint::write_i32_packed(&mut writer, -1)?;
//! assert_eq!(writer.as_slice(), &[249, 0xF0, 0x08, 1]);
//!
//! let mut reader = BufferReader::from_writer(&writer);
//! assert_eq!(varint::read_u64_packed(&mut reader)?, 2288);
//! assert_eq!(varint::read_i32_packed(&mut reader)?, -1);
//! # Ok::<(), netpack::Error>(())
//! ```

use crate::{
    utils::{used_byte_count_u32, used_byte_count_u64, ZigZag},
    BufferReader, BufferWriter, Result,
};

/// Largest value stored in a single byte
pub const SINGLE_BYTE_MAX: u64 = 240;
/// Largest value stored in two bytes
pub const TWO_BYTE_MAX: u64 = 2287;
/// Header bytes above this carry an explicit payload length of `header - 247`
pub const LENGTH_HEADER_BASE: u8 = 247;

/// Number of bytes [`write_u64_packed`] emits for `value`.
#[must_use]
pub const fn packed_size_u64(value: u64) -> usize {
    if value <= SINGLE_BYTE_MAX {
        1
    } else if value <= TWO_BYTE_MAX {
        2
    } else {
        used_byte_count_u64(value) + 1
    }
}

/// Writes a `u64` varint.
///
/// The whole encoding is reserved up front; on error nothing is written.
///
/// # Errors
///
/// Returns [`crate::Error::CapacityExceeded`] or [`crate::Error::BitwiseContextActive`].
pub fn write_u64_packed(writer: &mut BufferWriter, value: u64) -> Result<()> {
    if value <= SINGLE_BYTE_MAX {
        return writer.write_byte(value as u8);
    }
    if value <= TWO_BYTE_MAX {
        return write_two_byte(writer, value);
    }

    let count = used_byte_count_u64(value);
    let mut batch = writer.reserve(count + 1)?;
    batch.write_byte(LENGTH_HEADER_BASE + count as u8);
    batch.write_partial(value, count);
    Ok(())
}

/// Writes a `u32` varint. Same encoding as [`write_u64_packed`], sized with the 32-bit counter.
///
/// # Errors
///
/// Returns [`crate::Error::CapacityExceeded`] or [`crate::Error::BitwiseContextActive`].
pub fn write_u32_packed(writer: &mut BufferWriter, value: u32) -> Result<()> {
    let wide = u64::from(value);
    if wide <= SINGLE_BYTE_MAX {
        return writer.write_byte(value as u8);
    }
    if wide <= TWO_BYTE_MAX {
        return write_two_byte(writer, wide);
    }

    let count = used_byte_count_u32(value);
    let mut batch = writer.reserve(count + 1)?;
    batch.write_byte(LENGTH_HEADER_BASE + count as u8);
    batch.write_partial(wide, count);
    Ok(())
}

/// Writes a `u16` varint through the 32-bit path.
///
/// # Errors
///
/// Returns [`crate::Error::CapacityExceeded`] or [`crate::Error::BitwiseContextActive`].
pub fn write_u16_packed(writer: &mut BufferWriter, value: u16) -> Result<()> {
    write_u32_packed(writer, u32::from(value))
}

/// Writes an `i64` as a zigzag-mapped varint.
///
/// # Errors
///
/// Returns [`crate::Error::CapacityExceeded`] or [`crate::Error::BitwiseContextActive`].
pub fn write_i64_packed(writer: &mut BufferWriter, value: i64) -> Result<()> {
    write_u64_packed(writer, value.zigzag())
}

/// Writes an `i32` as a zigzag-mapped varint.
///
/// # Errors
///
/// Returns [`crate::Error::CapacityExceeded`] or [`crate::Error::BitwiseContextActive`].
pub fn write_i32_packed(writer: &mut BufferWriter, value: i32) -> Result<()> {
    write_u32_packed(writer, value.zigzag())
}

/// Writes an `i16` as a zigzag-mapped varint.
///
/// # Errors
///
/// Returns [`crate::Error::CapacityExceeded`] or [`crate::Error::BitwiseContextActive`].
pub fn write_i16_packed(writer: &mut BufferWriter, value: i16) -> Result<()> {
    write_u32_packed(writer, u32::from(value.zigzag()))
}

/// Reads a `u64` varint.
///
/// The header is peeked first and the full encoding is bounds checked as one unit, so a
/// truncated value leaves the position unchanged.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if the input ends inside the value.
pub fn read_u64_packed(reader: &mut BufferReader<'_>) -> Result<u64> {
    let header = reader.peek_byte()?;
    if u64::from(header) <= SINGLE_BYTE_MAX {
        return reader.read_byte().map(u64::from);
    }
    if header <= LENGTH_HEADER_BASE + 1 {
        let mut batch = reader.begin_read(2)?;
        batch.read_byte();
        let low = batch.read_byte();
        return Ok(two_byte_value(header, low));
    }

    let count = usize::from(header - LENGTH_HEADER_BASE);
    let mut batch = reader.begin_read(count + 1)?;
    batch.read_byte();
    Ok(batch.read_partial(count))
}

/// Reads a `u32` varint.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] on truncated input, or [`crate::Error::Malformed`] if
/// the header announces more than four payload bytes.
pub fn read_u32_packed(reader: &mut BufferReader<'_>) -> Result<u32> {
    let header = reader.peek_byte()?;
    if header > LENGTH_HEADER_BASE + 4 {
        return Err(malformed_error!(
            "Varint header {} announces {} bytes for a 32-bit value",
            header,
            header - LENGTH_HEADER_BASE
        ));
    }

    let value = read_u64_packed(reader)?;
    Ok(value as u32)
}

/// Reads a `u16` varint through the 32-bit path.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] on truncated input, or [`crate::Error::Malformed`] if
/// the decoded value does not fit 16 bits, in which case the position is not advanced.
pub fn read_u16_packed(reader: &mut BufferReader<'_>) -> Result<u16> {
    reader.transactional(|reader| {
        let value = read_u32_packed(reader)?;
        u16::try_from(value)
            .map_err(|_| malformed_error!("Varint value {} does not fit 16 bits", value))
    })
}

/// Reads a zigzag-mapped `i64` varint.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] on truncated input.
pub fn read_i64_packed(reader: &mut BufferReader<'_>) -> Result<i64> {
    read_u64_packed(reader).map(i64::unzigzag)
}

/// Reads a zigzag-mapped `i32` varint.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] or [`crate::Error::Malformed`].
pub fn read_i32_packed(reader: &mut BufferReader<'_>) -> Result<i32> {
    read_u32_packed(reader).map(i32::unzigzag)
}

/// Reads a zigzag-mapped `i16` varint.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] or [`crate::Error::Malformed`].
pub fn read_i16_packed(reader: &mut BufferReader<'_>) -> Result<i16> {
    read_u16_packed(reader).map(i16::unzigzag)
}

fn write_two_byte(writer: &mut BufferWriter, value: u64) -> Result<()> {
    let offset = value - SINGLE_BYTE_MAX;
    let mut batch = writer.reserve(2)?;
    batch.write_byte(241 + (offset >> 8) as u8);
    batch.write_byte((offset & 0xFF) as u8);
    Ok(())
}

fn two_byte_value(header: u8, low: u8) -> u64 {
    SINGLE_BYTE_MAX + (u64::from(header - 241) << 8) + u64::from(low)
}
