//! Q31.32 fixed-point primitives and the packed complex scalar.
//!
//! Every component is a signed 64-bit two's-complement value with 32
//! fractional bits. Intermediate products and quotients are formed at double
//! width (`i128`/`u128`), rounded to nearest with ties away from zero, and
//! saturated back to the component range.
//!
//! | Item | Width | Layout |
//! |------|-------|--------|
//! | Component | 64 bits | Q31.32, two's complement |
//! | Complex | 128 bits | `[real (127:64) | imag (63:0)]` |
//! | Immediate component | 45 bits | Q22.23, resized on decode |

use std::fmt;

/// Number of fractional bits in a component.
pub const FRAC_BITS: u32 = 32;

/// Raw encoding of 1.0.
pub const ONE: i64 = 1 << FRAC_BITS;

/// Fractional bits of the 45-bit immediate sub-fields (Q22.23).
pub const IMM_FRAC_BITS: u32 = 23;

/// Width of one immediate sub-field.
pub const IMM_WIDTH: u32 = 45;

/// Saturate a double-width value to the component range.
#[inline]
pub fn saturate(wide: i128) -> i64 {
    wide.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Shift right by `shift` bits, rounding to nearest with ties away from zero.
#[inline]
pub fn round_shift(wide: i128, shift: u32) -> i128 {
    if shift == 0 {
        return wide;
    }
    let half = 1u128 << (shift - 1);
    let magnitude = (wide.unsigned_abs() + half) >> shift;
    if wide < 0 {
        -(magnitude as i128)
    } else {
        magnitude as i128
    }
}

/// Fixed-point multiply.
#[inline]
pub fn mul(a: i64, b: i64) -> i64 {
    saturate(round_shift(a as i128 * b as i128, FRAC_BITS))
}

/// Fixed-point divide. A zero denominator yields zero.
pub fn div(num: i64, den: i64) -> i64 {
    if den == 0 {
        return 0;
    }
    let n = (num.unsigned_abs() as u128) << FRAC_BITS;
    let d = den.unsigned_abs() as u128;
    // (2n + d) / 2d rounds half away from zero on magnitudes
    let q = (2 * n + d) / (2 * d);
    if (num < 0) != (den < 0) {
        saturate(-(q as i128))
    } else {
        saturate(q as i128)
    }
}

/// Real square root.
///
/// Seeds Newton-Raphson with `2^ceil(msb/2)` where `msb` is the index of the
/// highest set bit of the scaled operand, then runs exactly two iterations.
/// Zero and negative inputs return zero.
pub fn sqrt(x: i64) -> i64 {
    if x <= 0 {
        return 0;
    }
    let w = (x as u128) << FRAC_BITS;
    let msb = 127 - w.leading_zeros();
    let mut g = 1u128 << msb.div_ceil(2);
    for _ in 0..2 {
        g = (g + w / g) >> 1;
    }
    saturate(g as i128)
}

/// Half of `a + b`, computed without intermediate overflow.
#[inline]
pub fn half_sum(a: i64, b: i64) -> i64 {
    saturate((a as i128 + b as i128) >> 1)
}

/// Sign-extend a Q22.23 immediate sub-field and resize it to Q31.32.
#[inline]
pub fn from_immediate(field: u64) -> i64 {
    let shift = 64 - IMM_WIDTH;
    let extended = ((field << shift) as i64) >> shift;
    extended << (FRAC_BITS - IMM_FRAC_BITS)
}

/// Resize a Q31.32 value into a 45-bit Q22.23 sub-field.
///
/// Low fractional bits are dropped and out-of-range values saturate.
#[inline]
pub fn to_immediate(value: i64) -> u64 {
    let max = (1i64 << (IMM_WIDTH - 1)) - 1;
    let narrowed = (value >> (FRAC_BITS - IMM_FRAC_BITS)).clamp(-max - 1, max);
    (narrowed as u64) & ((1u64 << IMM_WIDTH) - 1)
}

/// Convert a raw component to `f64`.
#[inline]
pub fn to_f64(raw: i64) -> f64 {
    raw as f64 / ONE as f64
}

/// Convert an `f64` to a raw component, truncating toward zero.
#[inline]
pub fn from_f64(value: f64) -> i64 {
    // `as` saturates on overflow and maps NaN to zero
    (value * ONE as f64) as i64
}

/// A fixed-point complex scalar.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Complex {
    /// Real component (raw Q31.32).
    pub re: i64,
    /// Imaginary component (raw Q31.32).
    pub im: i64,
}

impl Complex {
    /// 0 + 0i.
    pub const ZERO: Complex = Complex { re: 0, im: 0 };

    /// 1 + 0i.
    pub const ONE: Complex = Complex { re: ONE, im: 0 };

    /// Build from raw components.
    #[inline]
    pub const fn new(re: i64, im: i64) -> Self {
        Self { re, im }
    }

    /// Build from integer-valued components.
    #[inline]
    pub const fn from_int(re: i32, im: i32) -> Self {
        Self {
            re: (re as i64) << FRAC_BITS,
            im: (im as i64) << FRAC_BITS,
        }
    }

    /// Build from floating-point components (truncating).
    pub fn from_f64(re: f64, im: f64) -> Self {
        Self {
            re: from_f64(re),
            im: from_f64(im),
        }
    }

    /// Components as floating point.
    pub fn to_f64(self) -> (f64, f64) {
        (to_f64(self.re), to_f64(self.im))
    }

    /// True when both components are zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.re == 0 && self.im == 0
    }

    /// Pack into the 128-bit `[real | imag]` word.
    #[inline]
    pub const fn pack(self) -> u128 {
        ((self.re as u64 as u128) << 64) | (self.im as u64 as u128)
    }

    /// Unpack from a 128-bit `[real | imag]` word.
    #[inline]
    pub const fn unpack(word: u128) -> Self {
        Self {
            re: (word >> 64) as u64 as i64,
            im: word as u64 as i64,
        }
    }
}

impl fmt::Debug for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Complex({}, raw=0x{:016X}:0x{:016X})", self, self.re, self.im)
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (re, im) = self.to_f64();
        write!(f, "({:.6} {:+.6}i)", re, im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_shift_ties_away_from_zero() {
        assert_eq!(round_shift(3, 1), 2); // 1.5 -> 2
        assert_eq!(round_shift(-3, 1), -2); // -1.5 -> -2
        assert_eq!(round_shift(5, 2), 1); // 1.25 -> 1
        assert_eq!(round_shift(-5, 2), -1);
        assert_eq!(round_shift(6, 2), 2); // 1.5 -> 2
    }

    #[test]
    fn test_mul_integers_exact() {
        assert_eq!(mul(3 * ONE, -4 * ONE), -12 * ONE);
        assert_eq!(mul(ONE / 2, ONE / 2), ONE / 4);
    }

    #[test]
    fn test_mul_saturates() {
        assert_eq!(mul(i64::MAX, i64::MAX), i64::MAX);
        assert_eq!(mul(i64::MAX, -i64::MAX), i64::MIN);
    }

    #[test]
    fn test_div() {
        assert_eq!(div(3 * ONE, 4 * ONE), 3 * ONE / 4);
        assert_eq!(div(-ONE, 4 * ONE), -ONE / 4);
        assert_eq!(div(ONE, -ONE), -ONE);
        assert_eq!(div(5 * ONE, 0), 0);
    }

    #[test]
    fn test_div_rounds_to_nearest() {
        // 1/3 = 0x5555_5555.55.. rounds down, 2/3 = 0xAAAA_AAAA.AA.. rounds up
        assert_eq!(div(ONE, 3 * ONE), 0x5555_5555);
        assert_eq!(div(2 * ONE, 3 * ONE), 0xAAAA_AAAB);
        assert_eq!(div(-2 * ONE, 3 * ONE), -0xAAAA_AAAB);
    }

    #[test]
    fn test_sqrt_exact_powers() {
        assert_eq!(sqrt(ONE), ONE);
        assert_eq!(sqrt(4 * ONE), 2 * ONE);
        assert_eq!(sqrt(16 * ONE), 4 * ONE);
        assert_eq!(sqrt(ONE / 4), ONE / 2);
    }

    #[test]
    fn test_sqrt_two_iterations_only() {
        // Seed 2.0, then 1.5, then 1.41666..
        let r = to_f64(sqrt(2 * ONE));
        assert!((r - 1.416_666).abs() < 1e-5, "got {}", r);
    }

    #[test]
    fn test_sqrt_non_positive() {
        assert_eq!(sqrt(0), 0);
        assert_eq!(sqrt(-4 * ONE), 0);
    }

    #[test]
    fn test_immediate_resize() {
        // 1.0 in Q22.23
        assert_eq!(from_immediate(1 << 23), ONE);
        // -1.0 as a 45-bit two's-complement field
        let minus_one = (1u64 << 45) - (1 << 23);
        assert_eq!(from_immediate(minus_one), -ONE);
        assert_eq!(to_immediate(-ONE), minus_one);
        assert_eq!(to_immediate(ONE + ONE / 2), 3 << 22);
    }

    #[test]
    fn test_complex_pack_layout() {
        let z = Complex::from_int(1, -1);
        let word = z.pack();
        assert_eq!((word >> 64) as u64, ONE as u64);
        assert_eq!(word as u64, (-ONE) as u64);
        assert_eq!(Complex::unpack(word), z);
    }

    #[test]
    fn test_complex_display() {
        let z = Complex::from_f64(1.5, -0.25);
        assert_eq!(z.to_string(), "(1.500000 -0.250000i)");
    }
}
