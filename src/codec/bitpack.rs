//! Fixed-budget bit-packed integers.
//!
//! A bit-packed value trades a few bits of range for a length header that lives inside the
//! value itself. The low `H` bits of the first byte hold `byte_count - 1` and the value is
//! stored shifted left past them:
//!
//! | Type | Header bits | Payload bytes | Budget |
//! |------|-------------|---------------|--------|
//! | `u16` | 1 | 1-2 | 15 bits |
//! | `u32` | 2 | 1-4 | 30 bits |
//! | `u64` | 3 | 1-8 | 61 bits |
//!
//! Signed types are zigzag-mapped first, so their magnitude budget is one bit smaller
//! (14/29/60 bits). Values outside the budget are rejected with
//! [`crate::Error::BitBudgetExceeded`]; they are never truncated.
//!
//! # Examples
//!
//! ```rust
//! use netpack::{codec::BitPacked, BufferReader, BufferWriter};
//!
//! let mut writer = BufferWriter::new(16, 16)?;
//! 5u32.write_bit_packed(&mut writer)?;
//! (-3i64).write_bit_packed(&mut writer)?;
//! assert_eq!(writer.as_slice(), &[5 << 2, 5 << 3]);
//!
//! let mut reader = BufferReader::from_writer(&writer);
//! assert_eq!(u32::read_bit_packed(&mut reader)?, 5);
//! assert_eq!(i64::read_bit_packed(&mut reader)?, -3);
//! # Ok::<(), netpack::Error>(())
//! ```

use crate::{
    utils::{used_byte_count_u64, ZigZag},
    BufferReader, BufferWriter, Error, Result,
};

/// Largest `u16` accepted by the bit-packed encoding
pub const BIT_PACKED_U16_MAX: u16 = (1 << 15) - 1;
/// Smallest `i16` accepted by the bit-packed encoding
pub const BIT_PACKED_I16_MIN: i16 = -(1 << 14);
/// Largest `i16` accepted by the bit-packed encoding
pub const BIT_PACKED_I16_MAX: i16 = (1 << 14) - 1;
/// Largest `u32` accepted by the bit-packed encoding
pub const BIT_PACKED_U32_MAX: u32 = (1 << 30) - 1;
/// Smallest `i32` accepted by the bit-packed encoding
pub const BIT_PACKED_I32_MIN: i32 = -(1 << 29);
/// Largest `i32` accepted by the bit-packed encoding
pub const BIT_PACKED_I32_MAX: i32 = (1 << 29) - 1;
/// Largest `u64` accepted by the bit-packed encoding
pub const BIT_PACKED_U64_MAX: u64 = (1 << 61) - 1;
/// Smallest `i64` accepted by the bit-packed encoding
pub const BIT_PACKED_I64_MIN: i64 = -(1 << 60);
/// Largest `i64` accepted by the bit-packed encoding
pub const BIT_PACKED_I64_MAX: i64 = (1 << 60) - 1;

/// Integers with a self-delimiting bit-packed encoding.
pub trait BitPacked: Sized + Copy {
    /// Writes `self` bit-packed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BitBudgetExceeded`] if the value is outside the type's budget, or any
    /// capacity error from the writer. Nothing is written on error.
    fn write_bit_packed(self, writer: &mut BufferWriter) -> Result<()>;

    /// Reads a bit-packed value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] on truncated input; the position is left unchanged.
    fn read_bit_packed(reader: &mut BufferReader<'_>) -> Result<Self>;
}

/// Header layout of one unsigned width.
struct Layout {
    header_bits: u32,
    budget_bits: u32,
}

const U16_LAYOUT: Layout = Layout {
    header_bits: 1,
    budget_bits: 15,
};
const U32_LAYOUT: Layout = Layout {
    header_bits: 2,
    budget_bits: 30,
};
const U64_LAYOUT: Layout = Layout {
    header_bits: 3,
    budget_bits: 61,
};

impl Layout {
    fn write(&self, writer: &mut BufferWriter, value: u64) -> Result<()> {
        if value >> self.budget_bits != 0 {
            return Err(Error::BitBudgetExceeded {
                value,
                bits: self.budget_bits,
            });
        }

        let shifted = value << self.header_bits;
        let count = used_byte_count_u64(shifted);
        writer
            .reserve(count)?
            .write_partial(shifted | (count as u64 - 1), count);
        Ok(())
    }

    fn read(&self, reader: &mut BufferReader<'_>) -> Result<u64> {
        let mask = (1u8 << self.header_bits) - 1;
        let count = usize::from(reader.peek_byte()? & mask) + 1;
        let raw = reader.begin_read(count)?.read_partial(count);
        Ok(raw >> self.header_bits)
    }
}

impl BitPacked for u16 {
    fn write_bit_packed(self, writer: &mut BufferWriter) -> Result<()> {
        U16_LAYOUT.write(writer, u64::from(self))
    }

    fn read_bit_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        let value = U16_LAYOUT.read(reader)?;
        Ok(value as u16)
    }
}

impl BitPacked for u32 {
    fn write_bit_packed(self, writer: &mut BufferWriter) -> Result<()> {
        U32_LAYOUT.write(writer, u64::from(self))
    }

    fn read_bit_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        let value = U32_LAYOUT.read(reader)?;
        Ok(value as u32)
    }
}

impl BitPacked for u64 {
    fn write_bit_packed(self, writer: &mut BufferWriter) -> Result<()> {
        U64_LAYOUT.write(writer, self)
    }

    fn read_bit_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        U64_LAYOUT.read(reader)
    }
}

macro_rules! impl_signed_bit_packed {
    ($signed:ty, $unsigned:ty) => {
        impl BitPacked for $signed {
            fn write_bit_packed(self, writer: &mut BufferWriter) -> Result<()> {
                self.zigzag().write_bit_packed(writer)
            }

            fn read_bit_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
                <$unsigned>::read_bit_packed(reader).map(<$signed>::unzigzag)
            }
        }
    };
}

impl_signed_bit_packed!(i16, u16);
impl_signed_bit_packed!(i32, u32);
impl_signed_bit_packed!(i64, u64);

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T: BitPacked>(value: T) -> Result<Vec<u8>> {
        let mut writer = BufferWriter::new(16, 16)?;
        value.write_bit_packed(&mut writer)?;
        Ok(writer.to_vec())
    }

    fn roundtrip<T: BitPacked + PartialEq + std::fmt::Debug>(value: T) -> usize {
        let bytes = encode(value).unwrap();
        let mut reader = BufferReader::borrowed(&bytes);
        assert_eq!(T::read_bit_packed(&mut reader).unwrap(), value);
        assert_eq!(reader.remaining(), 0);
        bytes.len()
    }

    #[test]
    fn header_layout() {
        assert_eq!(encode(0u16).unwrap(), vec![0]);
        assert_eq!(encode(127u16).unwrap(), vec![0xFE]);
        assert_eq!(encode(128u16).unwrap(), vec![0x01, 0x01]);
        assert_eq!(encode(63u32).unwrap(), vec![63 << 2]);
        assert_eq!(encode(64u32).unwrap(), vec![0x01, 0x01]);
        assert_eq!(encode(31u64).unwrap(), vec![31 << 3]);
        assert_eq!(encode(32u64).unwrap(), vec![0x01, 0x01]);
    }

    #[test]
    fn boundary_roundtrips() {
        assert_eq!(roundtrip(BIT_PACKED_U16_MAX), 2);
        assert_eq!(roundtrip(BIT_PACKED_U32_MAX), 4);
        assert_eq!(roundtrip(BIT_PACKED_U64_MAX), 8);
        assert_eq!(roundtrip(BIT_PACKED_I16_MIN), 2);
        assert_eq!(roundtrip(BIT_PACKED_I16_MAX), 2);
        assert_eq!(roundtrip(BIT_PACKED_I32_MIN), 4);
        assert_eq!(roundtrip(BIT_PACKED_I32_MAX), 4);
        assert_eq!(roundtrip(BIT_PACKED_I64_MIN), 8);
        assert_eq!(roundtrip(BIT_PACKED_I64_MAX), 8);
        assert_eq!(roundtrip(-1i32), 1);
    }

    #[test]
    fn budget_is_enforced() {
        assert_eq!(
            encode(BIT_PACKED_U16_MAX + 1),
            Err(Error::BitBudgetExceeded {
                value: 1 << 15,
                bits: 15
            })
        );
        assert!(encode(BIT_PACKED_U32_MAX + 1).is_err());
        assert!(encode(BIT_PACKED_U64_MAX + 1).is_err());
        assert!(encode(BIT_PACKED_I16_MAX + 1).is_err());
        assert!(encode(BIT_PACKED_I16_MIN - 1).is_err());
        assert!(encode(BIT_PACKED_I32_MIN - 1).is_err());
        assert!(encode(BIT_PACKED_I64_MAX + 1).is_err());
        assert!(encode(i64::MIN).is_err());
    }

    #[test]
    fn rejected_value_writes_nothing() {
        let mut writer = BufferWriter::new(8, 8).unwrap();
        assert!(u32::MAX.write_bit_packed(&mut writer).is_err());
        assert_eq!(writer.position(), 0);
    }

    #[test]
    fn sixteen_bit_size_exception() {
        // 2 bytes either way at the top of the budget, but a varint would need 3
        assert_eq!(encode(BIT_PACKED_U16_MAX).unwrap().len(), 2);
        assert_eq!(crate::codec::varint::packed_size_u64(u64::from(BIT_PACKED_U16_MAX)), 3);
    }

    #[test]
    fn truncated_input() {
        let mut reader = BufferReader::borrowed(&[0b11, 0, 0]);
        assert!(matches!(
            u32::read_bit_packed(&mut reader),
            Err(Error::OutOfBounds { .. })
        ));
        assert_eq!(reader.position(), 0);
    }
}
