//! Bit-granular writes.
//!
//! A [`BitWriter`] is a scoped sub-context of a [`BufferWriter`]. It holds the writer's
//! exclusive borrow, so the borrow checker rejects bytewise writes while bits are being written.
//! Dropping the context advances the parent position by the number of bytes touched, rounded up.
//!
//! Bits are packed LSB-first: bit 0 of the context lands in bit 0 of the first byte. Bytes are
//! zeroed when the first bit lands on them, so unused high bits of the final byte read as zero.
//!
//! ```rust
//! use netpack::BufferWriter;
//!
//! let mut writer = BufferWriter::new(4, 4)?;
//! {
//!     let mut bits = writer.enter_bitwise_context()?;
//!     bits.write_bit(true)?;
//!     bits.write_bit(false)?;
//!     bits.write_bits(0b11, 2)?;
//! }
//! assert_eq!(writer.position(), 1);
//! assert_eq!(writer.as_slice(), &[0b0000_1101]);
//! # Ok::<(), netpack::Error>(())
//! ```

use log::trace;

use crate::{buffer::writer::BufferWriter, Error, Result};

/// Bit-level write context over a [`BufferWriter`].
#[derive(Debug)]
pub struct BitWriter<'w> {
    writer: &'w mut BufferWriter,
    /// Byte offset of the first bit
    start: usize,
    /// Bits written so far
    bit_position: usize,
}

impl<'w> BitWriter<'w> {
    pub(crate) fn new(writer: &'w mut BufferWriter) -> Self {
        let start = writer.position();
        trace!("Entering bitwise write context at byte {start}");
        BitWriter {
            writer,
            start,
            bit_position: 0,
        }
    }

    /// Number of bits written in this context.
    #[must_use]
    pub fn bit_position(&self) -> usize {
        self.bit_position
    }

    /// Returns `true` if the bit position lies on a byte boundary.
    #[must_use]
    pub fn bit_aligned(&self) -> bool {
        self.bit_position % 8 == 0
    }

    /// Whole bytes touched so far; what the parent position advances by on drop.
    #[must_use]
    pub fn bytes_touched(&self) -> usize {
        self.bit_position.div_ceil(8)
    }

    /// Batched bounds check for `count` more bits, growing the parent if necessary.
    #[must_use]
    pub fn try_begin_write_bits(&mut self, count: usize) -> bool {
        match self.end_for(count) {
            Some(end) => self.writer.ensure_capacity(end),
            None => false,
        }
    }

    /// Writes a single bit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the byte holding the bit cannot be allocated.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.require_bits(1)?;
        self.put_bit(bit);
        Ok(())
    }

    /// Writes the low `count` bits of `value`, least significant first.
    ///
    /// Whole bytes take a fast path: a straight copy when the context is byte-aligned, a
    /// two-byte split otherwise. Leftover bits are written one at a time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BitCountOutOfRange`] if `count > 64`, or [`Error::CapacityExceeded`].
    pub fn write_bits(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 64 {
            return Err(Error::BitCountOutOfRange {
                requested: count,
                max: 64,
            });
        }
        self.require_bits(count)?;

        let whole_bytes = count / 8;
        let bytes = value.to_le_bytes();
        if self.bit_aligned() {
            let offset = self.start + self.bit_position / 8;
            self.writer.storage_mut()[offset..offset + whole_bytes]
                .copy_from_slice(&bytes[..whole_bytes]);
            self.bit_position += whole_bytes * 8;
        } else {
            for &byte in &bytes[..whole_bytes] {
                self.put_misaligned_byte(byte);
            }
        }

        for bit in whole_bytes * 8..count {
            self.put_bit((value >> bit) & 1 != 0);
        }
        Ok(())
    }

    /// Writes the low `count` bits of a byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BitCountOutOfRange`] if `count > 8`, or [`Error::CapacityExceeded`].
    pub fn write_bits_u8(&mut self, value: u8, count: usize) -> Result<()> {
        if count > 8 {
            return Err(Error::BitCountOutOfRange {
                requested: count,
                max: 8,
            });
        }
        self.require_bits(count)?;
        for bit in 0..count {
            self.put_bit((value >> bit) & 1 != 0);
        }
        Ok(())
    }

    /// Absolute byte end needed to hold `count` more bits.
    fn end_for(&self, count: usize) -> Option<usize> {
        let bits = self.bit_position.checked_add(count)?;
        self.start.checked_add(bits.div_ceil(8))
    }

    fn require_bits(&mut self, count: usize) -> Result<()> {
        if self.try_begin_write_bits(count) {
            return Ok(());
        }
        Err(capacity_error!(
            (self.bit_position % 8 + count).div_ceil(8),
            self.start + self.bit_position / 8,
            self.writer.max_capacity()
        ))
    }

    fn put_bit(&mut self, bit: bool) {
        let offset = self.bit_position % 8;
        let index = self.start + self.bit_position / 8;
        let byte = &mut self.writer.storage_mut()[index];
        if offset == 0 {
            *byte = 0;
        }
        if bit {
            *byte |= 1 << offset;
        } else {
            *byte &= !(1 << offset);
        }
        self.bit_position += 1;
    }

    /// Splits a byte across the current partial byte and the next one.
    fn put_misaligned_byte(&mut self, value: u8) {
        let offset = self.bit_position % 8;
        let index = self.start + self.bit_position / 8;
        let storage = self.writer.storage_mut();
        storage[index] = (storage[index] & (0xFF >> (8 - offset))) | (value << offset);
        storage[index + 1] = value >> (8 - offset);
        self.bit_position += 8;
    }
}

impl Drop for BitWriter<'_> {
    fn drop(&mut self) {
        let bytes = self.bytes_touched();
        trace!(
            "Leaving bitwise write context: {} bits, {} bytes",
            self.bit_position,
            bytes
        );
        self.writer.commit_bitwise_writes(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsb_first_packing() {
        let mut writer = BufferWriter::new(4, 4).unwrap();
        {
            let mut bits = writer.enter_bitwise_context().unwrap();
            bits.write_bit(true).unwrap();
            bits.write_bit(false).unwrap();
            bits.write_bit(true).unwrap();
            bits.write_bit(true).unwrap();
            assert_eq!(bits.bit_position(), 4);
            assert!(!bits.bit_aligned());
        }
        assert_eq!(writer.position(), 1);
        assert_eq!(writer.as_slice(), &[0b0000_1101]);
    }

    #[test]
    fn high_bits_zeroed_over_dirty_bytes() {
        let mut writer = BufferWriter::new(4, 4).unwrap();
        writer.write_bytes(&[0xFF, 0xFF, 0xFF]).unwrap();
        writer.seek(0);
        {
            let mut bits = writer.enter_bitwise_context().unwrap();
            bits.write_bits(0b101, 3).unwrap();
        }
        assert_eq!(writer.position(), 1);
        assert_eq!(writer.as_slice()[0], 0b0000_0101);
    }

    #[test]
    fn aligned_whole_bytes() {
        let mut writer = BufferWriter::new(8, 8).unwrap();
        {
            let mut bits = writer.enter_bitwise_context().unwrap();
            bits.write_bits(0x00AB_CDEF, 24).unwrap();
            assert!(bits.bit_aligned());
        }
        assert_eq!(writer.as_slice(), &[0xEF, 0xCD, 0xAB]);
    }

    #[test]
    fn misaligned_whole_bytes() {
        let mut writer = BufferWriter::new(8, 8).unwrap();
        {
            let mut bits = writer.enter_bitwise_context().unwrap();
            bits.write_bit(true).unwrap();
            bits.write_bits(0xFF, 8).unwrap();
            bits.write_bits(0b10, 2).unwrap();
            assert_eq!(bits.bytes_touched(), 2);
        }
        assert_eq!(writer.as_slice(), &[0xFF, 0b0000_0101]);
    }

    #[test]
    fn full_width_value() {
        let mut writer = BufferWriter::new(16, 16).unwrap();
        {
            let mut bits = writer.enter_bitwise_context().unwrap();
            bits.write_bits_u8(0b1, 1).unwrap();
            bits.write_bits(u64::MAX, 64).unwrap();
        }
        assert_eq!(writer.position(), 9);
        assert_eq!(writer.as_slice()[0], 0xFF);
        assert_eq!(writer.as_slice()[8], 0x01);
    }

    #[test]
    fn bit_count_limits() {
        let mut writer = BufferWriter::new(16, 16).unwrap();
        let mut bits = writer.enter_bitwise_context().unwrap();
        assert_eq!(
            bits.write_bits(0, 65),
            Err(Error::BitCountOutOfRange {
                requested: 65,
                max: 64
            })
        );
        assert_eq!(
            bits.write_bits_u8(0, 9),
            Err(Error::BitCountOutOfRange {
                requested: 9,
                max: 8
            })
        );
        assert_eq!(bits.bit_position(), 0);
    }

    #[test]
    fn grows_parent() {
        let mut writer = BufferWriter::new(1, 8).unwrap();
        {
            let mut bits = writer.enter_bitwise_context().unwrap();
            assert!(bits.try_begin_write_bits(20));
            bits.write_bits(0xFFFFF, 20).unwrap();
        }
        assert_eq!(writer.position(), 3);
        assert!(writer.capacity() >= 3);
    }

    #[test]
    fn capacity_exceeded() {
        let mut writer = BufferWriter::new(1, 1).unwrap();
        let mut bits = writer.enter_bitwise_context().unwrap();
        bits.write_bits(0x7F, 7).unwrap();
        assert!(bits.write_bit(true).is_ok());
        assert!(matches!(
            bits.write_bit(true),
            Err(Error::CapacityExceeded { .. })
        ));
        assert_eq!(bits.bit_position(), 8);
    }

    #[test]
    fn empty_context_advances_nothing() {
        let mut writer = BufferWriter::new(4, 4).unwrap();
        drop(writer.enter_bitwise_context().unwrap());
        assert_eq!(writer.position(), 0);
        assert!(!writer.in_bitwise_context());
    }

    #[test]
    fn leaked_context_blocks_bytewise_writes() {
        let mut writer = BufferWriter::new(4, 4).unwrap();
        std::mem::forget(writer.enter_bitwise_context().unwrap());
        assert!(writer.in_bitwise_context());
        assert_eq!(writer.write_byte(1), Err(Error::BitwiseContextActive));
        assert!(!writer.try_begin_write(1));
        assert!(matches!(
            writer.enter_bitwise_context(),
            Err(Error::BitwiseContextActive)
        ));
    }
}
