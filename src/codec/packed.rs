//! Per-type packed encodings.
//!
//! [`Packed`] picks the compact wire form for each supported value shape at compile time:
//!
//! | Type | Encoding |
//! |------|----------|
//! | `u8`, `i8` | one raw byte |
//! | `bool` | one byte, `0` or `1` |
//! | `u16`, `u32`, `u64` | varint |
//! | `i16`, `i32`, `i64` | zigzag, then varint |
//! | `f32`, `f64` | IEEE-754 bit pattern as an unsigned varint |
//! | `char` | scalar value as a `u32` varint |
//! | `String` | varint unit count, then every UTF-16 unit as a varint |
//! | `Vec<T>` | varint element count, then every element packed |
//!
//! Packing strings unit by unit costs more CPU than a byte copy, but mostly-ASCII text shrinks
//! to one byte per character.
//!
//! Composite reads run inside [`BufferReader::transactional`], so a truncated string or vector
//! leaves the reader where it started.

use widestring::U16String;

use crate::{
    codec::varint::{
        read_u16_packed, read_u32_packed, read_u64_packed, write_u16_packed, write_u32_packed,
        write_u64_packed,
    },
    utils::ZigZag,
    BufferReader, BufferWriter, Result,
};

/// Values with a compact packed encoding.
///
/// # Examples
///
/// ```rust
/// use netpack::{codec::Packed, BufferReader, BufferWriter};
///
/// let mut writer = BufferWriter::new(8, 64)?;
/// "hi".to_string().write_packed(&mut writer)?;
/// vec![1i32, -1].write_packed(&mut writer)?;
/// assert_eq!(writer.as_slice(), &[2, b'h', b'i', 2, 2, 1]);
///
/// let mut reader = BufferReader::from_writer(&writer);
/// assert_eq!(String::read_packed(&mut reader)?, "hi");
/// assert_eq!(Vec::<i32>::read_packed(&mut reader)?, vec![1, -1]);
/// # Ok::<(), netpack::Error>(())
/// ```
pub trait Packed: Sized {
    /// Writes `self` in its packed form.
    ///
    /// # Errors
    ///
    /// Returns any capacity or context error from the writer.
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()>;

    /// Reads a value in its packed form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] on truncated input or [`crate::Error::Malformed`]
    /// if the bytes do not decode to a valid value.
    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self>;
}

/// Writes `value` in its packed form.
///
/// # Errors
///
/// Returns any capacity or context error from the writer.
pub fn write_value_packed<T: Packed>(writer: &mut BufferWriter, value: &T) -> Result<()> {
    value.write_packed(writer)
}

/// Reads a `T` in its packed form.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] or [`crate::Error::Malformed`].
pub fn read_value_packed<T: Packed>(reader: &mut BufferReader<'_>) -> Result<T> {
    T::read_packed(reader)
}

/// Writes a string slice in the packed string form without allocating a `String`.
///
/// # Errors
///
/// Returns any capacity or context error from the writer, or [`crate::Error::Malformed`] if
/// the string has more than `u32::MAX` UTF-16 units.
pub fn write_str_packed(writer: &mut BufferWriter, value: &str) -> Result<()> {
    let units = U16String::from_str(value);
    let count = u32::try_from(units.len())
        .map_err(|_| malformed_error!("String of {} units is too long", units.len()))?;

    write_u32_packed(writer, count)?;
    for &unit in units.as_slice() {
        write_u16_packed(writer, unit)?;
    }
    Ok(())
}

/// Reads a packed element count and checks it against the remaining input.
///
/// Every packed value takes at least one byte, so a count larger than the remaining bytes
/// cannot be satisfied.
fn read_count(reader: &mut BufferReader<'_>) -> Result<usize> {
    let count = read_u32_packed(reader)? as usize;
    if count > reader.remaining() {
        return Err(out_of_bounds_error!(
            count,
            reader.position(),
            reader.length()
        ));
    }
    Ok(count)
}

impl Packed for u8 {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        writer.write_byte(*self)
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        reader.read_byte()
    }
}

impl Packed for i8 {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        writer.write_byte(self.to_le_bytes()[0])
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        reader.read_byte().map(|byte| i8::from_le_bytes([byte]))
    }
}

impl Packed for bool {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        writer.write_bool(*self)
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        reader.read_bool()
    }
}

impl Packed for u16 {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        write_u16_packed(writer, *self)
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        read_u16_packed(reader)
    }
}

impl Packed for u32 {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        write_u32_packed(writer, *self)
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        read_u32_packed(reader)
    }
}

impl Packed for u64 {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        write_u64_packed(writer, *self)
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        read_u64_packed(reader)
    }
}

macro_rules! impl_packed_zigzag {
    ($(($signed:ty, $unsigned:ty)),+) => {
        $(
            impl Packed for $signed {
                fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
                    self.zigzag().write_packed(writer)
                }

                fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
                    <$unsigned>::read_packed(reader).map(<$signed>::unzigzag)
                }
            }
        )+
    };
}

impl_packed_zigzag!((i16, u16), (i32, u32), (i64, u64));

impl Packed for f32 {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        write_u32_packed(writer, self.to_bits())
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        read_u32_packed(reader).map(f32::from_bits)
    }
}

impl Packed for f64 {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        write_u64_packed(writer, self.to_bits())
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        read_u64_packed(reader).map(f64::from_bits)
    }
}

impl Packed for char {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        write_u32_packed(writer, u32::from(*self))
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        reader.transactional(|reader| {
            let scalar = read_u32_packed(reader)?;
            char::from_u32(scalar)
                .ok_or_else(|| malformed_error!("Invalid char scalar 0x{:X}", scalar))
        })
    }
}

impl Packed for String {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        write_str_packed(writer, self)
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        reader.transactional(|reader| {
            let count = read_count(reader)?;
            let mut units = Vec::with_capacity(count);
            for _ in 0..count {
                units.push(read_u16_packed(reader)?);
            }
            U16String::from_vec(units)
                .to_string()
                .map_err(|e| malformed_error!("Invalid UTF-16 string: {}", e))
        })
    }
}

impl<T: Packed> Packed for Vec<T> {
    fn write_packed(&self, writer: &mut BufferWriter) -> Result<()> {
        let count = u32::try_from(self.len())
            .map_err(|_| malformed_error!("Vector of {} elements is too long", self.len()))?;

        write_u32_packed(writer, count)?;
        for element in self {
            element.write_packed(writer)?;
        }
        Ok(())
    }

    fn read_packed(reader: &mut BufferReader<'_>) -> Result<Self> {
        reader.transactional(|reader| {
            let count = read_count(reader)?;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(T::read_packed(reader)?);
            }
            Ok(values)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn roundtrip<T: Packed + PartialEq + std::fmt::Debug>(value: T) -> usize {
        let mut writer = BufferWriter::new(8, 4096).unwrap();
        write_value_packed(&mut writer, &value).unwrap();
        let mut reader = BufferReader::from_writer(&writer);
        assert_eq!(read_value_packed::<T>(&mut reader).unwrap(), value);
        assert_eq!(reader.remaining(), 0);
        writer.length()
    }

    #[test]
    fn scalar_sizes() {
        assert_eq!(roundtrip(0xFFu8), 1);
        assert_eq!(roundtrip(-128i8), 1);
        assert_eq!(roundtrip(true), 1);
        assert_eq!(roundtrip(7u16), 1);
        assert_eq!(roundtrip(u16::MAX), 3);
        assert_eq!(roundtrip(-1i16), 1);
        assert_eq!(roundtrip(i16::MIN), 3);
        assert_eq!(roundtrip(-1i32), 1);
        assert_eq!(roundtrip(i32::MIN), 5);
        assert_eq!(roundtrip(-1i64), 1);
        assert_eq!(roundtrip(i64::MIN), 9);
        assert_eq!(roundtrip(u64::MAX), 9);
    }

    #[test]
    fn floats_use_bit_patterns() {
        assert_eq!(roundtrip(0.0f32), 1);
        assert_eq!(roundtrip(0.0f64), 1);
        roundtrip(-1.5f32);
        roundtrip(f64::MAX);
        roundtrip(f64::NEG_INFINITY);
    }

    #[test]
    fn chars() {
        assert_eq!(roundtrip('a'), 1);
        roundtrip('é');
        roundtrip('🦀');

        let mut writer = BufferWriter::new(8, 8).unwrap();
        write_u32_packed(&mut writer, 0xD800).unwrap();
        let mut reader = BufferReader::from_writer(&writer);
        assert!(matches!(
            char::read_packed(&mut reader),
            Err(Error::Malformed { .. })
        ));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn strings() {
        assert_eq!(roundtrip(String::new()), 1);
        assert_eq!(roundtrip("ascii".to_string()), 6);
        roundtrip("Grüße 🦀".to_string());
    }

    #[test]
    fn vectors() {
        assert_eq!(roundtrip(Vec::<u32>::new()), 1);
        assert_eq!(roundtrip(vec![1u32, 2, 3]), 4);
        roundtrip(vec![vec![-1i64, 1_000_000], vec![]]);
        roundtrip(vec!["a".to_string(), "bc".to_string()]);
    }

    #[test]
    fn oversized_count_is_rejected() {
        let mut writer = BufferWriter::new(8, 8).unwrap();
        write_u32_packed(&mut writer, 1_000_000).unwrap();
        writer.write_byte(1).unwrap();
        let mut reader = BufferReader::from_writer(&writer);
        assert!(matches!(
            Vec::<u8>::read_packed(&mut reader),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(
            String::read_packed(&mut reader),
            Err(Error::OutOfBounds { .. })
        ));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn truncated_vector_rewinds() {
        let mut writer = BufferWriter::new(8, 64).unwrap();
        vec![1u64, 2, 70000].write_packed(&mut writer).unwrap();
        let bytes = writer.to_vec();
        let mut reader = BufferReader::borrowed(&bytes[..bytes.len() - 1]);
        assert!(Vec::<u64>::read_packed(&mut reader).is_err());
        assert_eq!(reader.position(), 0);
    }
}
