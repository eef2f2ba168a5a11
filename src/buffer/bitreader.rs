//! Bit-granular reads, the mirror of [`crate::buffer::bitwriter`].
//!
//! ```rust
//! use netpack::BufferReader;
//!
//! let mut reader = BufferReader::borrowed(&[0b0000_1101, 0xAA]);
//! {
//!     let mut bits = reader.enter_bitwise_context()?;
//!     assert!(bits.read_bit()?);
//!     assert!(!bits.read_bit()?);
//!     assert_eq!(bits.read_bits(2)?, 0b11);
//! }
//! assert_eq!(reader.position(), 1);
//! assert_eq!(reader.read_byte()?, 0xAA);
//! # Ok::<(), netpack::Error>(())
//! ```

use log::trace;

use crate::{buffer::reader::BufferReader, Error, Result};

/// Bit-level read context over a [`BufferReader`].
///
/// Dropping the context advances the reader by the bytes its bits touched, rounded up.
#[derive(Debug)]
pub struct BitReader<'r, 'a> {
    reader: &'r mut BufferReader<'a>,
    start: usize,
    bit_position: usize,
}

impl<'r, 'a> BitReader<'r, 'a> {
    pub(crate) fn new(reader: &'r mut BufferReader<'a>) -> Self {
        let start = reader.position();
        trace!("Entering bitwise read context at byte {start}");
        BitReader {
            reader,
            start,
            bit_position: 0,
        }
    }

    /// Number of bits read in this context.
    #[must_use]
    pub fn bit_position(&self) -> usize {
        self.bit_position
    }

    /// Returns `true` if the bit position lies on a byte boundary.
    #[must_use]
    pub fn bit_aligned(&self) -> bool {
        self.bit_position % 8 == 0
    }

    /// Returns `true` if `count` more bits are available.
    #[must_use]
    pub fn try_begin_read_bits(&self, count: usize) -> bool {
        self.bit_position
            .checked_add(count)
            .and_then(|bits| self.start.checked_add(bits.div_ceil(8)))
            .is_some_and(|end| end <= self.reader.length())
    }

    /// Reads a single bit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] at the end of the data.
    pub fn read_bit(&mut self) -> Result<bool> {
        self.require_bits(1)?;
        Ok(self.take_bit())
    }

    /// Reads `count` bits (0-64) into the low bits of a `u64`, least significant first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BitCountOutOfRange`] if `count > 64`, or [`Error::OutOfBounds`].
    pub fn read_bits(&mut self, count: usize) -> Result<u64> {
        if count > 64 {
            return Err(Error::BitCountOutOfRange {
                requested: count,
                max: 64,
            });
        }
        self.require_bits(count)?;

        let whole_bytes = count / 8;
        let mut bytes = [0u8; 8];
        if self.bit_aligned() {
            let offset = self.start + self.bit_position / 8;
            bytes[..whole_bytes]
                .copy_from_slice(&self.reader.as_slice()[offset..offset + whole_bytes]);
            self.bit_position += whole_bytes * 8;
        } else {
            for byte in &mut bytes[..whole_bytes] {
                *byte = self.take_misaligned_byte();
            }
        }

        let mut value = u64::from_le_bytes(bytes);
        for bit in whole_bytes * 8..count {
            if self.take_bit() {
                value |= 1 << bit;
            }
        }
        Ok(value)
    }

    /// Reads `count` bits (0-8) into the low bits of a byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BitCountOutOfRange`] if `count > 8`, or [`Error::OutOfBounds`].
    pub fn read_bits_u8(&mut self, count: usize) -> Result<u8> {
        if count > 8 {
            return Err(Error::BitCountOutOfRange {
                requested: count,
                max: 8,
            });
        }
        self.require_bits(count)?;

        let mut value = 0u8;
        for bit in 0..count {
            if self.take_bit() {
                value |= 1 << bit;
            }
        }
        Ok(value)
    }

    fn require_bits(&self, count: usize) -> Result<()> {
        if self.try_begin_read_bits(count) {
            return Ok(());
        }
        Err(out_of_bounds_error!(
            (self.bit_position % 8 + count).div_ceil(8),
            self.start + self.bit_position / 8,
            self.reader.length()
        ))
    }

    fn take_bit(&mut self) -> bool {
        let offset = self.bit_position % 8;
        let byte = self.reader.as_slice()[self.start + self.bit_position / 8];
        self.bit_position += 1;
        (byte >> offset) & 1 != 0
    }

    fn take_misaligned_byte(&mut self) -> u8 {
        let offset = self.bit_position % 8;
        let index = self.start + self.bit_position / 8;
        let data = self.reader.as_slice();
        let value = (data[index] >> offset) | (data[index + 1] << (8 - offset));
        self.bit_position += 8;
        value
    }
}

impl Drop for BitReader<'_, '_> {
    fn drop(&mut self) {
        let bytes = self.bit_position.div_ceil(8);
        trace!(
            "Leaving bitwise read context: {} bits, {} bytes",
            self.bit_position,
            bytes
        );
        self.reader.commit_bitwise_reads(bytes);
    }
}
