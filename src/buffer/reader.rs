//! Bounds-checked read cursor.
//!
//! [`BufferReader`] walks a byte region that is either borrowed from the caller or owned by the
//! reader. Every read method validates the request against the readable length and returns
//! [`crate::Error::OutOfBounds`] without moving the position when it does not fit.
//!
//! Like the writer, hot loops can batch the check with [`BufferReader::begin_read`], which returns
//! a [`ReadReservation`] token whose reads skip the per-call bounds check.
//!
//! # Examples
//!
//! ```rust
//! use netpack::{BufferReader, BufferWriter};
//!
//! let mut writer = BufferWriter::new(32, 32)?;
//! writer.write_value(&7u16)?;
//! writer.write_string("hello", true)?;
//!
//! let mut reader = BufferReader::borrowed(writer.as_slice());
//! assert_eq!(reader.read_value::<u16>()?, 7);
//! assert_eq!(reader.read_string(true)?, "hello");
//! assert_eq!(reader.remaining(), 0);
//! # Ok::<(), netpack::Error>(())
//! ```

use std::borrow::Cow;

use widestring::U16String;
use zerocopy::{FromZeros, IntoBytes};

use crate::{
    buffer::{
        bitreader::BitReader,
        io::{read_at, read_partial_at, Blittable},
        writer::BufferWriter,
    },
    Error, Result,
};

/// A read cursor over borrowed or owned bytes.
#[derive(Debug, Clone)]
pub struct BufferReader<'a> {
    data: Cow<'a, [u8]>,
    position: usize,
    in_bitwise_context: bool,
}

impl<'a> BufferReader<'a> {
    /// Reads directly from `data` without copying.
    #[must_use]
    pub fn borrowed(data: &'a [u8]) -> Self {
        BufferReader {
            data: Cow::Borrowed(data),
            position: 0,
            in_bitwise_context: false,
        }
    }

    /// Copies `data` into a reader that owns its bytes.
    #[must_use]
    pub fn from_slice(data: &[u8]) -> BufferReader<'static> {
        BufferReader::from_vec(data.to_vec())
    }

    /// Takes ownership of `data`.
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> BufferReader<'static> {
        BufferReader {
            data: Cow::Owned(data),
            position: 0,
            in_bitwise_context: false,
        }
    }

    /// Copies the written bytes `[0, length)` of `writer`.
    #[must_use]
    pub fn from_writer(writer: &BufferWriter) -> BufferReader<'static> {
        BufferReader::from_slice(writer.as_slice())
    }

    /// Copies `length` bytes of `data` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if the range does not lie within `data`.
    pub fn with_range(data: &[u8], offset: usize, length: usize) -> Result<BufferReader<'static>> {
        match offset.checked_add(length) {
            Some(end) if end <= data.len() => Ok(BufferReader::from_slice(&data[offset..end])),
            _ => Err(out_of_bounds_error!(length, offset, data.len())),
        }
    }

    /// Current read position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total readable length.
    #[must_use]
    pub fn length(&self) -> usize {
        self.data.len()
    }

    /// Bytes left between the position and the end.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns `true` if at least one more byte can be read.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns `true` if the reader holds no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` while a [`BitReader`] derived from this reader is live (or was leaked).
    #[must_use]
    pub fn in_bitwise_context(&self) -> bool {
        self.in_bitwise_context
    }

    /// All readable bytes, independent of the position.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Copies all readable bytes.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Moves the cursor to `pos`, clamped to the readable length.
    pub fn seek(&mut self, pos: usize) {
        self.position = pos.min(self.data.len());
    }

    /// Opens a bit-granular sub-context starting at the current position.
    ///
    /// When the returned [`BitReader`] is dropped, the position advances by the number of bytes
    /// its bits touched (rounded up).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BitwiseContextActive`] if a previous context was leaked.
    pub fn enter_bitwise_context(&mut self) -> Result<BitReader<'_, 'a>> {
        if self.in_bitwise_context {
            return Err(Error::BitwiseContextActive);
        }
        self.in_bitwise_context = true;
        Ok(BitReader::new(self))
    }

    /// Batched bounds check: returns `true` if `bytes` more bytes can be read.
    ///
    /// Returns `false` while a bitwise context is active.
    #[must_use]
    pub fn try_begin_read(&self, bytes: usize) -> bool {
        !self.in_bitwise_context && bytes <= self.remaining()
    }

    /// Same as [`BufferReader::try_begin_read`] for `size_of::<T>()` bytes.
    #[must_use]
    pub fn try_begin_read_value<T: Blittable>(&self) -> bool {
        self.try_begin_read(std::mem::size_of::<T>())
    }

    /// Batched bounds check returning a capability token for unchecked reads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BitwiseContextActive`] if a bit context is active, or
    /// [`Error::OutOfBounds`] if fewer than `bytes` bytes remain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use netpack::BufferReader;
    ///
    /// let mut reader = BufferReader::borrowed(&[1, 2, 3, 4, 5]);
    /// let mut batch = reader.begin_read(3)?;
    /// assert_eq!(batch.read_byte(), 1);
    /// assert_eq!(batch.read_partial(2), 0x0302);
    /// drop(batch);
    /// assert_eq!(reader.position(), 3);
    /// # Ok::<(), netpack::Error>(())
    /// ```
    pub fn begin_read(&mut self, bytes: usize) -> Result<ReadReservation<'_, 'a>> {
        self.check_bytewise()?;
        if bytes > self.remaining() {
            return Err(out_of_bounds_error!(bytes, self.position, self.data.len()));
        }
        let end = self.position + bytes;
        Ok(ReadReservation { reader: self, end })
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] or [`Error::BitwiseContextActive`].
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Returns the byte at the position without consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] or [`Error::BitwiseContextActive`].
    pub fn peek_byte(&self) -> Result<u8> {
        self.check_bytewise()?;
        self.data
            .get(self.position)
            .copied()
            .ok_or_else(|| out_of_bounds_error!(1, self.position, self.data.len()))
    }

    /// Reads `count` bytes and returns them as a slice into the reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] or [`Error::BitwiseContextActive`].
    pub fn read_bytes(&mut self, count: usize) -> Result<&[u8]> {
        self.take(count)
    }

    /// Fills `target` from the stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] or [`Error::BitwiseContextActive`].
    pub fn read_bytes_into(&mut self, target: &mut [u8]) -> Result<()> {
        target.copy_from_slice(self.take(target.len())?);
        Ok(())
    }

    /// Reads the in-memory (native-endian) representation of a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] or [`Error::BitwiseContextActive`].
    pub fn read_value<T: Blittable>(&mut self) -> Result<T> {
        self.check_bytewise()?;
        read_at(&self.data, &mut self.position)
    }

    /// Reads a `bool` written as one byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] for any byte other than `0` or `1`, in which case the
    /// position is not advanced.
    pub fn read_bool(&mut self) -> Result<bool> {
        let value = decode_bool(self.peek_byte()?)?;
        self.position += 1;
        Ok(value)
    }

    /// Reads `count` little-endian bytes (0-8) zero-extended to a `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`], [`Error::BitwiseContextActive`], or
    /// [`Error::Malformed`] if `count > 8`.
    pub fn read_partial(&mut self, count: usize) -> Result<u64> {
        self.check_bytewise()?;
        read_partial_at(&self.data, &mut self.position, count)
    }

    /// Reads a `u32` element count followed by that many raw elements.
    ///
    /// The count is checked against the remaining bytes before anything is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if the count claims more data than is present.
    pub fn read_vec<T: Blittable>(&mut self) -> Result<Vec<T>> {
        self.transactional(|reader| {
            let count = reader.read_value::<u32>()? as usize;
            let element_size = std::mem::size_of::<T>();
            let byte_len = count
                .checked_mul(element_size)
                .filter(|&len| len <= reader.remaining())
                .ok_or_else(|| {
                    out_of_bounds_error!(
                        count.saturating_mul(element_size),
                        reader.position,
                        reader.data.len()
                    )
                })?;

            if element_size == 0 {
                return Ok(vec![T::new_zeroed(); count]);
            }

            let bytes = reader.take(byte_len)?;
            let mut values = Vec::with_capacity(count);
            let mut offset = 0;
            while offset < bytes.len() {
                values.push(read_at::<T>(bytes, &mut offset)?);
            }
            Ok(values)
        })
    }

    /// Reads a string written by [`BufferWriter::write_string`] with the same `one_byte_chars`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if the data is truncated, or [`Error::Malformed`] if the
    /// UTF-16 units do not form a valid string.
    pub fn read_string(&mut self, one_byte_chars: bool) -> Result<String> {
        self.transactional(|reader| {
            let count = reader.read_value::<u32>()? as usize;
            let unit_size = if one_byte_chars { 1 } else { 2 };
            if count.saturating_mul(unit_size) > reader.remaining() {
                return Err(out_of_bounds_error!(
                    count.saturating_mul(unit_size),
                    reader.position,
                    reader.data.len()
                ));
            }

            let units: Vec<u16> = if one_byte_chars {
                reader.take(count)?.iter().map(|&b| u16::from(b)).collect()
            } else {
                let mut units = vec![0u16; count];
                reader.read_bytes_into(units.as_mut_bytes())?;
                units
            };

            U16String::from_vec(units)
                .to_string()
                .map_err(|e| malformed_error!("Invalid UTF-16 string: {}", e))
        })
    }

    /// Runs `f` and rewinds the position if it fails.
    ///
    /// Composite reads that issue several calls use this to restore the single-call guarantee
    /// that a failed read does not move the cursor.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub fn transactional<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.position;
        let result = f(self);
        if result.is_err() && !self.in_bitwise_context {
            self.position = start;
        }
        result
    }

    /// Called by [`BitReader`] on drop.
    pub(crate) fn commit_bitwise_reads(&mut self, bytes: usize) {
        self.position += bytes;
        self.in_bitwise_context = false;
    }

    fn check_bytewise(&self) -> Result<()> {
        if self.in_bitwise_context {
            return Err(Error::BitwiseContextActive);
        }
        Ok(())
    }

    /// Checked read window: returns `[position, position + len)` and advances past it.
    fn take(&mut self, len: usize) -> Result<&[u8]> {
        self.check_bytewise()?;
        if len > self.remaining() {
            return Err(out_of_bounds_error!(len, self.position, self.data.len()));
        }
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }
}

/// Capability token for reads whose bounds were verified up front.
///
/// Obtained from [`BufferReader::begin_read`]. Reading past the reserved window is a programmer
/// error and panics in every build configuration.
#[derive(Debug)]
pub struct ReadReservation<'r, 'a> {
    reader: &'r mut BufferReader<'a>,
    /// Absolute end of the reserved window
    end: usize,
}

impl ReadReservation<'_, '_> {
    /// Current read position of the underlying reader.
    #[must_use]
    pub fn position(&self) -> usize {
        self.reader.position
    }

    /// Bytes left in the reserved window.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.end - self.reader.position
    }

    /// Reads one byte.
    ///
    /// # Panics
    ///
    /// Panics if the reserved window is exhausted.
    pub fn read_byte(&mut self) -> u8 {
        self.window(1)[0]
    }

    /// Reads `count` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the remaining reserved window.
    pub fn read_bytes(&mut self, count: usize) -> &[u8] {
        self.window(count)
    }

    /// Reads the in-memory representation of a `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` does not fit the remaining reserved window.
    pub fn read_value<T: Blittable>(&mut self) -> T {
        let mut value = T::new_zeroed();
        value
            .as_mut_bytes()
            .copy_from_slice(self.window(std::mem::size_of::<T>()));
        value
    }

    /// Reads a one-byte `bool`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] for any byte other than `0` or `1`.
    ///
    /// # Panics
    ///
    /// Panics if the reserved window is exhausted.
    pub fn read_bool(&mut self) -> Result<bool> {
        decode_bool(self.read_byte())
    }

    /// Reads `count` little-endian bytes zero-extended to a `u64`.
    ///
    /// # Panics
    ///
    /// Panics if `count > 8` or the bytes exceed the remaining reserved window.
    pub fn read_partial(&mut self, count: usize) -> u64 {
        assert!(count <= 8, "partial value of {count} bytes");
        let mut bytes = [0u8; 8];
        bytes[..count].copy_from_slice(self.window(count));
        u64::from_le_bytes(bytes)
    }

    fn window(&mut self, len: usize) -> &[u8] {
        let start = self.reader.position;
        assert!(
            len <= self.end - start,
            "read of {len} bytes at {start} exceeds the reservation ending at {}",
            self.end
        );
        self.reader.position = start + len;
        &self.reader.data[start..start + len]
    }
}

fn decode_bool(byte: u8) -> Result<bool> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(malformed_error!("Invalid bool byte 0x{:02X}", other)),
    }
}
