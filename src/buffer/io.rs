//! Slice-level primitive reads and writes.
//!
//! This module is the foundation the cursors are built on: bounds-checked functions that copy
//! a value into or out of a byte slice at an offset and advance that offset. The cursors add
//! position tracking, growth and bit contexts on top; the codecs never touch slices directly.
//!
//! # Key Components
//!
//! - [`Blittable`] - compile-time marker for types that may be copied byte-for-byte
//! - [`read_at`] / [`write_at`] - native-endian copy of a [`Blittable`] value
//! - [`read_partial_at`] / [`write_partial_at`] - the low `n` bytes of a `u64`, little-endian
//!
//! # Byte Order
//!
//! [`read_at`] and [`write_at`] copy the in-memory representation, which is native-endian.
//! Partial values are always little-endian, since the varint and bit-packed formats define
//! their payload as "the low `n` bytes" and the header bits live in the first byte.
//!
//! # Examples
//!
//! ```rust
//! use netpack::buffer::io::{read_at, read_partial_at, write_at, write_partial_at};
//!
//! let mut data = [0u8; 7];
//! let mut offset = 0;
//! write_at(&mut data, &mut offset, &0x0102_0304u32)?;
//! write_partial_at(&mut data, &mut offset, 0x00AA_BBCC, 3)?;
//! assert_eq!(offset, 7);
//! assert_eq!(&data[4..], &[0xCC, 0xBB, 0xAA]);
//!
//! let mut offset = 0;
//! assert_eq!(read_at::<u32>(&data, &mut offset)?, 0x0102_0304);
//! assert_eq!(read_partial_at(&data, &mut offset, 3)?, 0x00AA_BBCC);
//! # Ok::<(), netpack::Error>(())
//! ```

use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::Result;

/// Types that are safe to copy into and out of a buffer byte-for-byte.
///
/// This is a blanket alias over zerocopy's derive-checked traits: a type qualifies when every
/// byte of it is initialized ([`IntoBytes`]), every bit pattern is a valid value
/// ([`FromBytes`]), and it has no interior mutability ([`Immutable`]). Pointers, references,
/// padding and `bool` are rejected at compile time.
///
/// All primitive integers, floats, and arrays of them qualify. User structs opt in by deriving
/// the zerocopy traits:
///
/// ```rust
/// use netpack::{buffer::io::Blittable, BufferReader, BufferWriter};
/// use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
///
/// #[derive(Clone, Copy, Debug, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
/// #[repr(C)]
/// struct Position {
///     x: f32,
///     y: f32,
///     z: f32,
/// }
///
/// fn assert_blittable<T: Blittable>() {}
/// assert_blittable::<Position>();
///
/// let mut writer = BufferWriter::new(16, 16)?;
/// writer.write_value(&Position { x: 1.0, y: 2.0, z: 3.0 })?;
/// let mut reader = BufferReader::from_writer(&writer);
/// assert_eq!(reader.read_value::<Position>()?, Position { x: 1.0, y: 2.0, z: 3.0 });
/// # Ok::<(), netpack::Error>(())
/// ```
pub trait Blittable: FromBytes + IntoBytes + Immutable + Copy {}

impl<T> Blittable for T where T: FromBytes + IntoBytes + Immutable + Copy {}

/// Reads a [`Blittable`] value at `offset` and advances the offset past it.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_at<T: Blittable>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let end = check_range(data.len(), *offset, type_len)?;

    let Ok(value) = T::read_from_bytes(&data[*offset..end]) else {
        return Err(out_of_bounds_error!(type_len, *offset, data.len()));
    };

    *offset = end;
    Ok(value)
}

/// Writes a [`Blittable`] value at `offset` and advances the offset past it.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn write_at<T: Blittable>(data: &mut [u8], offset: &mut usize, value: &T) -> Result<()> {
    let bytes = value.as_bytes();
    let end = check_range(data.len(), *offset, bytes.len())?;

    data[*offset..end].copy_from_slice(bytes);
    *offset = end;
    Ok(())
}

/// Reads `count` little-endian bytes (0-8) at `offset` and zero-extends them to a `u64`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if fewer than `count` bytes remain, or
/// [`crate::Error::Malformed`] if `count` is larger than 8.
pub fn read_partial_at(data: &[u8], offset: &mut usize, count: usize) -> Result<u64> {
    if count > 8 {
        return Err(malformed_error!(
            "Partial value of {} bytes does not fit in 64 bits",
            count
        ));
    }
    let end = check_range(data.len(), *offset, count)?;

    let mut bytes = [0u8; 8];
    bytes[..count].copy_from_slice(&data[*offset..end]);
    *offset = end;
    Ok(u64::from_le_bytes(bytes))
}

/// Writes the low `count` bytes (0-8) of `value` little-endian at `offset`.
///
/// Higher bytes of `value` are dropped.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if fewer than `count` bytes remain, or
/// [`crate::Error::Malformed`] if `count` is larger than 8.
pub fn write_partial_at(
    data: &mut [u8],
    offset: &mut usize,
    value: u64,
    count: usize,
) -> Result<()> {
    if count > 8 {
        return Err(malformed_error!(
            "Partial value of {} bytes does not fit in 64 bits",
            count
        ));
    }
    let end = check_range(data.len(), *offset, count)?;

    data[*offset..end].copy_from_slice(&value.to_le_bytes()[..count]);
    *offset = end;
    Ok(())
}

/// Returns `offset + len` if that range lies within `data_len`.
#[inline(always)]
fn check_range(data_len: usize, offset: usize, len: usize) -> Result<usize> {
    match offset.checked_add(len) {
        Some(end) if end <= data_len => Ok(end),
        _ => Err(out_of_bounds_error!(len, offset, data_len)),
    }
}
