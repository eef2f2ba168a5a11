//! Zigzag mapping between signed and unsigned integers.
//!
//! `zigzag(v) = (v << 1) ^ (v >> (width - 1))` folds the signed range onto the unsigned one so
//! that values of small magnitude, positive or negative, map to small unsigned values:
//! `0 -> 0`, `-1 -> 1`, `1 -> 2`, `-2 -> 3`, and so on. The inverse is
//! `(u >> 1) ^ -(u & 1)`. Both directions are bijections over the full range of the type.

/// Signed integer types that can be mapped onto their unsigned counterpart with zigzag encoding.
///
/// # Examples
///
/// ```rust
/// use netpack::utils::ZigZag;
///
/// assert_eq!((-1i64).zigzag(), 1);
/// assert_eq!(1i32.zigzag(), 2);
/// assert_eq!(i16::unzigzag(3), -2);
/// ```
pub trait ZigZag: Sized + Copy {
    /// Unsigned type of the same width
    type Unsigned: Copy;

    /// Map a signed value to its zigzag-encoded unsigned form
    fn zigzag(self) -> Self::Unsigned;

    /// Recover the signed value from its zigzag-encoded form
    fn unzigzag(value: Self::Unsigned) -> Self;
}

macro_rules! impl_zigzag {
    ($signed:ty, $unsigned:ty) => {
        impl ZigZag for $signed {
            type Unsigned = $unsigned;

            #[inline(always)]
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
            fn zigzag(self) -> $unsigned {
                ((self << 1) ^ (self >> (<$signed>::BITS - 1))) as $unsigned
            }

            #[inline(always)]
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
            fn unzigzag(value: $unsigned) -> $signed {
                ((value >> 1) as $signed) ^ -((value & 1) as $signed)
            }
        }
    };
}

impl_zigzag!(i16, u16);
impl_zigzag!(i32, u32);
impl_zigzag!(i64, u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_magnitudes_stay_small() {
        assert_eq!(0i64.zigzag(), 0);
        assert_eq!((-1i64).zigzag(), 1);
        assert_eq!(1i64.zigzag(), 2);
        assert_eq!((-2i64).zigzag(), 3);
        assert_eq!(2i64.zigzag(), 4);
    }

    #[test]
    fn extremes() {
        assert_eq!(i64::MAX.zigzag(), u64::MAX - 1);
        assert_eq!(i64::MIN.zigzag(), u64::MAX);
        assert_eq!(i32::MIN.zigzag(), u32::MAX);
        assert_eq!(i16::MAX.zigzag(), u16::MAX - 1);
    }

    #[test]
    fn roundtrip_i16_exhaustive() {
        let mut seen = vec![false; 1 << 16];
        for value in i16::MIN..=i16::MAX {
            let encoded = value.zigzag();
            assert!(!seen[usize::from(encoded)], "collision at {value}");
            seen[usize::from(encoded)] = true;
            assert_eq!(i16::unzigzag(encoded), value);
        }
    }

    #[test]
    fn roundtrip_i64_samples() {
        let samples = [
            0,
            1,
            -1,
            240,
            -240,
            2287,
            -2288,
            i64::from(i32::MAX),
            i64::from(i32::MIN),
            i64::MAX,
            i64::MIN,
            i64::MIN + 1,
        ];
        for value in samples {
            assert_eq!(i64::unzigzag(value.zigzag()), value);
        }
    }
}
