//! Branch-free minimal byte and bit counts.
//!
//! Every variable-length codec in this crate needs to know how many bytes a value actually
//! occupies. The functions here answer that with a De Bruijn lookup instead of a loop: the
//! value is smeared so that every bit below its highest set bit is one, everything except the
//! highest bit is cleared again, and the remaining power of two is multiplied by a De Bruijn
//! constant whose top bits form a unique index into a precomputed table.
//!
//! The lookup tables are generated at compile time from the De Bruijn constants, so the
//! byte and bit tables can never drift apart. The bit tables hold `position + 1`; the byte
//! tables hold `position / 8 + 1`.
//!
//! Zero is treated as occupying one bit and one byte, which is what the codecs need: a
//! zero payload still has to be written as a single byte.
//!
//! # Examples
//!
//! ```rust
//! use netpack::utils::{used_bit_count_u64, used_byte_count_u32, used_byte_count_u64};
//!
//! assert_eq!(used_byte_count_u64(0), 1);
//! assert_eq!(used_byte_count_u64(0x100), 2);
//! assert_eq!(used_byte_count_u32(u32::MAX), 4);
//! assert_eq!(used_bit_count_u64(0b1011), 4);
//! ```

const DE_BRUIJN_32: u32 = 0x077C_B531;
const DE_BRUIJN_64: u64 = 0x03F7_9D71_B4CB_0A89;

/// Bit position (0-31) for each 5-bit De Bruijn index
const POSITIONS_32: [u8; 32] = positions_32();
/// Bit position (0-63) for each 6-bit De Bruijn index
const POSITIONS_64: [u8; 64] = positions_64();

const BITS_32: [u8; 32] = counts_32(1, 1);
const BYTES_32: [u8; 32] = counts_32(8, 1);
const BITS_64: [u8; 64] = counts_64(1, 1);
const BYTES_64: [u8; 64] = counts_64(8, 1);

#[allow(clippy::cast_possible_truncation)]
const fn positions_32() -> [u8; 32] {
    let mut table = [0u8; 32];
    let mut bit = 0;
    while bit < 32 {
        let index = ((1u32 << bit).wrapping_mul(DE_BRUIJN_32) >> 27) as usize;
        table[index] = bit as u8;
        bit += 1;
    }
    table
}

#[allow(clippy::cast_possible_truncation)]
const fn positions_64() -> [u8; 64] {
    let mut table = [0u8; 64];
    let mut bit = 0;
    while bit < 64 {
        let index = ((1u64 << bit).wrapping_mul(DE_BRUIJN_64) >> 58) as usize;
        table[index] = bit as u8;
        bit += 1;
    }
    table
}

const fn counts_32(divisor: u8, bias: u8) -> [u8; 32] {
    let mut table = [0u8; 32];
    let mut i = 0;
    while i < 32 {
        table[i] = POSITIONS_32[i] / divisor + bias;
        i += 1;
    }
    table
}

const fn counts_64(divisor: u8, bias: u8) -> [u8; 64] {
    let mut table = [0u8; 64];
    let mut i = 0;
    while i < 64 {
        table[i] = POSITIONS_64[i] / divisor + bias;
        i += 1;
    }
    table
}

/// Reduces `value` to its highest set bit and returns the De Bruijn table index for it.
#[inline(always)]
const fn index_32(mut value: u32) -> usize {
    value |= value >> 1;
    value |= value >> 2;
    value |= value >> 4;
    value |= value >> 8;
    value |= value >> 16;
    value &= !(value >> 1);
    (value.wrapping_mul(DE_BRUIJN_32) >> 27) as usize
}

#[inline(always)]
#[allow(clippy::cast_possible_truncation)]
const fn index_64(mut value: u64) -> usize {
    value |= value >> 1;
    value |= value >> 2;
    value |= value >> 4;
    value |= value >> 8;
    value |= value >> 16;
    value |= value >> 32;
    value &= !(value >> 1);
    (value.wrapping_mul(DE_BRUIJN_64) >> 58) as usize
}

/// Returns the number of bytes needed to hold `value` (1-4).
#[inline]
#[must_use]
pub const fn used_byte_count_u32(value: u32) -> usize {
    BYTES_32[index_32(value)] as usize
}

/// Returns the number of bytes needed to hold `value` (1-8).
#[inline]
#[must_use]
pub const fn used_byte_count_u64(value: u64) -> usize {
    BYTES_64[index_64(value)] as usize
}

/// Returns the number of bits needed to hold `value` (1-32).
#[inline]
#[must_use]
pub const fn used_bit_count_u32(value: u32) -> usize {
    BITS_32[index_32(value)] as usize
}

/// Returns the number of bits needed to hold `value` (1-64).
#[inline]
#[must_use]
pub const fn used_bit_count_u64(value: u64) -> usize {
    BITS_64[index_64(value)] as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_bits(value: u64) -> usize {
        (64 - value.leading_zeros() as usize).max(1)
    }

    #[test]
    fn zero_counts_as_one() {
        assert_eq!(used_byte_count_u32(0), 1);
        assert_eq!(used_byte_count_u64(0), 1);
        assert_eq!(used_bit_count_u32(0), 1);
        assert_eq!(used_bit_count_u64(0), 1);
    }

    #[test]
    fn every_power_of_two_64() {
        for bit in 0..64 {
            let value = 1u64 << bit;
            assert_eq!(used_bit_count_u64(value), bit + 1, "bit {bit}");
            assert_eq!(used_byte_count_u64(value), bit / 8 + 1, "bit {bit}");
            // All ones below the boundary stay in the same byte/bit class
            let below = value | (value - 1);
            assert_eq!(used_bit_count_u64(below), bit + 1);
        }
    }

    #[test]
    fn every_power_of_two_32() {
        for bit in 0..32 {
            let value = 1u32 << bit;
            assert_eq!(used_bit_count_u32(value), bit + 1, "bit {bit}");
            assert_eq!(used_byte_count_u32(value), bit / 8 + 1, "bit {bit}");
        }
    }

    #[test]
    fn byte_boundaries() {
        assert_eq!(used_byte_count_u64(0xFF), 1);
        assert_eq!(used_byte_count_u64(0x100), 2);
        assert_eq!(used_byte_count_u64(0xFFFF), 2);
        assert_eq!(used_byte_count_u64(0x1_0000), 3);
        assert_eq!(used_byte_count_u64(0xFFFF_FFFF), 4);
        assert_eq!(used_byte_count_u64(0x1_0000_0000), 5);
        assert_eq!(used_byte_count_u64(u64::MAX), 8);
        assert_eq!(used_byte_count_u32(0x00FF_FFFF), 3);
        assert_eq!(used_byte_count_u32(0x0100_0000), 4);
    }

    #[test]
    fn matches_leading_zeros() {
        let mut value = 1u64;
        for _ in 0..2000 {
            assert_eq!(used_bit_count_u64(value), reference_bits(value));
            assert_eq!(used_byte_count_u64(value), reference_bits(value).div_ceil(8));
            #[allow(clippy::cast_possible_truncation)]
            let low = value as u32;
            assert_eq!(used_bit_count_u32(low), reference_bits(u64::from(low)));
            value = value.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        }
    }
}
