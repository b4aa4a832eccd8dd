//! Scalar complex ALU.
//!
//! All operations are total: overflow saturates per component and division
//! by zero yields zero. Nothing here can fail or panic.
//!
//! # Operations
//!
//! - **Arithmetic**: neg, conj, add, sub, mul (Gauss 3-multiply), div (Smith)
//! - **Magnitude**: abs2, abs, sqrt, recip
//! - **Extraction**: real, imag
//! - **Selection/compare**: max_abs, min_abs, lt_re, gt_re, le_re
//! - **Scaling**: scale by a real value

use crate::interpreter::fixed::{self, Complex, FRAC_BITS};
use crate::interpreter::instruction::{ImmediateOp, ScalarOp};

/// Scalar ALU execution unit.
pub struct ScalarAlu;

impl ScalarAlu {
    /// Execute an R-format scalar operation. Unary ops ignore `b`.
    pub fn execute(op: ScalarOp, a: Complex, b: Complex) -> Complex {
        match op {
            ScalarOp::Neg => Self::neg(a),
            ScalarOp::Conj => Self::conj(a),
            ScalarOp::Sqrt => Self::sqrt(a),
            ScalarOp::Abs2 => Self::abs2(a),
            ScalarOp::Abs => Self::abs(a),
            ScalarOp::Real => Self::real(a),
            ScalarOp::Imag => Self::imag(a),
            ScalarOp::Recip => Self::recip(a),
            ScalarOp::Add => Self::add(a, b),
            ScalarOp::Sub => Self::sub(a, b),
            ScalarOp::Mul => Self::mul(a, b),
            ScalarOp::Div => Self::div(a, b),
            ScalarOp::MaxAbs => Self::max_abs(a, b),
            ScalarOp::MinAbs => Self::min_abs(a, b),
            ScalarOp::LtRe => Self::lt_re(a, b),
            ScalarOp::GtRe => Self::gt_re(a, b),
            ScalarOp::LeRe => Self::le_re(a, b),
        }
    }

    /// Execute an I-format operation with the decoded immediate.
    pub fn execute_immediate(op: ImmediateOp, a: Complex, imm: Complex) -> Complex {
        match op {
            ImmediateOp::Load => imm,
            ImmediateOp::Add => Self::add(a, imm),
            ImmediateOp::Mul => Self::mul(a, imm),
            ImmediateOp::Sub => Self::sub(a, imm),
            ImmediateOp::Div => Self::div(a, imm),
            ImmediateOp::MaxAbs => Self::max_abs(a, imm),
            ImmediateOp::MinAbs => Self::min_abs(a, imm),
            ImmediateOp::Scale => Self::scale(a, imm.re),
        }
    }

    // ========== Arithmetic ==========

    #[inline]
    pub fn neg(a: Complex) -> Complex {
        Complex::new(a.re.saturating_neg(), a.im.saturating_neg())
    }

    #[inline]
    pub fn conj(a: Complex) -> Complex {
        Complex::new(a.re, a.im.saturating_neg())
    }

    #[inline]
    pub fn add(a: Complex, b: Complex) -> Complex {
        Complex::new(a.re.saturating_add(b.re), a.im.saturating_add(b.im))
    }

    #[inline]
    pub fn sub(a: Complex, b: Complex) -> Complex {
        Complex::new(a.re.saturating_sub(b.re), a.im.saturating_sub(b.im))
    }

    /// Complex multiply using three wide products.
    ///
    /// `re = m1 - m2`, `im = m3 - m1 - m2` with `m1 = ar·br`, `m2 = ai·bi`,
    /// `m3 = (ar+ai)·(br+bi)`. `m3` can exceed `i128`, but the true imaginary
    /// sum `ar·bi + ai·br` fits, so wrapping arithmetic recovers it exactly.
    pub fn mul(a: Complex, b: Complex) -> Complex {
        let (ar, ai) = (a.re as i128, a.im as i128);
        let (br, bi) = (b.re as i128, b.im as i128);

        let m1 = ar * br;
        let m2 = ai * bi;
        let m3 = (ar + ai).wrapping_mul(br + bi);

        let re = m1 - m2;
        let im = m3.wrapping_sub(m1).wrapping_sub(m2);

        Complex::new(
            fixed::saturate(fixed::round_shift(re, FRAC_BITS)),
            fixed::saturate(fixed::round_shift(im, FRAC_BITS)),
        )
    }

    /// Complex divide using Smith's algorithm. Zero divisor yields zero.
    pub fn div(a: Complex, b: Complex) -> Complex {
        if b.is_zero() {
            return Complex::ZERO;
        }

        if b.re.unsigned_abs() >= b.im.unsigned_abs() {
            let t = fixed::div(b.im, b.re);
            let den = b.re.saturating_add(fixed::mul(b.im, t));
            Complex::new(
                fixed::div(a.re.saturating_add(fixed::mul(a.im, t)), den),
                fixed::div(a.im.saturating_sub(fixed::mul(a.re, t)), den),
            )
        } else {
            let t = fixed::div(b.re, b.im);
            let den = b.im.saturating_add(fixed::mul(b.re, t));
            Complex::new(
                fixed::div(fixed::mul(a.re, t).saturating_add(a.im), den),
                fixed::div(fixed::mul(a.im, t).saturating_sub(a.re), den),
            )
        }
    }

    /// 1 / a.
    #[inline]
    pub fn recip(a: Complex) -> Complex {
        Self::div(Complex::ONE, a)
    }

    /// Scale both components by the real value `s`.
    #[inline]
    pub fn scale(a: Complex, s: i64) -> Complex {
        Complex::new(fixed::mul(a.re, s), fixed::mul(a.im, s))
    }

    // ========== Magnitude ==========

    /// Exact `re² + im²` before rescaling.
    #[inline]
    fn magnitude2(a: Complex) -> u128 {
        let re = a.re.unsigned_abs() as u128;
        let im = a.im.unsigned_abs() as u128;
        re * re + im * im
    }

    /// Raw `|a|²` component, rounded and saturated.
    fn abs2_raw(a: Complex) -> i64 {
        let half = 1u128 << (FRAC_BITS - 1);
        let scaled = (Self::magnitude2(a) + half) >> FRAC_BITS;
        scaled.min(i64::MAX as u128) as i64
    }

    /// `|a|²` as a real value.
    #[inline]
    pub fn abs2(a: Complex) -> Complex {
        Complex::new(Self::abs2_raw(a), 0)
    }

    /// `|a|` as a real value.
    #[inline]
    pub fn abs(a: Complex) -> Complex {
        Complex::new(fixed::sqrt(Self::abs2_raw(a)), 0)
    }

    /// Complex square root.
    ///
    /// The modulus is estimated as `max(|x|,|y|) + min(|x|,|y|)/2`. The
    /// result lies in the right half-plane with the sign of `y` carried by
    /// the imaginary part.
    pub fn sqrt(a: Complex) -> Complex {
        if a.is_zero() {
            return Complex::ZERO;
        }
        let (x, y) = (a.re, a.im);
        let ax = fixed::saturate(x.unsigned_abs() as i128);
        let ay = fixed::saturate(y.unsigned_abs() as i128);
        let r = ax.max(ay).saturating_add(ax.min(ay) / 2);

        if x >= 0 {
            let u = fixed::sqrt(fixed::half_sum(r, x));
            let v = fixed::div(y, u.saturating_add(u));
            Complex::new(u, v)
        } else {
            let s = fixed::sqrt(fixed::saturate((r as i128 - x as i128) >> 1));
            let v = if y >= 0 { s } else { -s };
            let u = fixed::div(ay, s.saturating_add(s));
            Complex::new(u, v)
        }
    }

    // ========== Extraction ==========

    #[inline]
    pub fn real(a: Complex) -> Complex {
        Complex::new(a.re, 0)
    }

    #[inline]
    pub fn imag(a: Complex) -> Complex {
        Complex::new(a.im, 0)
    }

    // ========== Selection / compare ==========

    /// `a` if `|a| >= |b|`, else `b`.
    #[inline]
    pub fn max_abs(a: Complex, b: Complex) -> Complex {
        if Self::magnitude2(a) >= Self::magnitude2(b) {
            a
        } else {
            b
        }
    }

    /// `a` if `|a| <= |b|`, else `b`.
    #[inline]
    pub fn min_abs(a: Complex, b: Complex) -> Complex {
        if Self::magnitude2(a) <= Self::magnitude2(b) {
            a
        } else {
            b
        }
    }

    #[inline]
    fn flag(cond: bool) -> Complex {
        if cond {
            Complex::ONE
        } else {
            Complex::ZERO
        }
    }

    #[inline]
    pub fn lt_re(a: Complex, b: Complex) -> Complex {
        Self::flag(a.re < b.re)
    }

    #[inline]
    pub fn gt_re(a: Complex, b: Complex) -> Complex {
        Self::flag(a.re > b.re)
    }

    #[inline]
    pub fn le_re(a: Complex, b: Complex) -> Complex {
        Self::flag(a.re <= b.re)
    }

    /// Order two values by magnitude, for reductions.
    #[inline]
    pub(crate) fn magnitude_gt(a: Complex, b: Complex) -> bool {
        Self::magnitude2(a) > Self::magnitude2(b)
    }
}
