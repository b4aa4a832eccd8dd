//! Vector ALU execution unit.
//!
//! Handles 8-lane complex vectors. Lanes are independent for element-wise
//! and broadcast ops; reductions walk the lanes in order 0..8 so rounding
//! and saturation are deterministic.
//!
//! # Operations
//!
//! - **Lane-wise**: vadd, vsub, vmul, vdiv, vconj
//! - **Broadcast**: vsadd, vssub, vsmul, vsdiv (scalar applied to every lane)
//! - **Reduction**: dotc, dotu, iamax, sum, asum

use crate::interpreter::fixed::Complex;
use crate::interpreter::instruction::{BroadcastOp, ReduceOp, VectorOp};
use crate::interpreter::state::{Lanes, ZERO_LANES};

use super::scalar::ScalarAlu;

/// Vector ALU execution unit.
pub struct VectorAlu;

impl VectorAlu {
    /// Execute a lane-wise operation.
    pub fn execute(op: VectorOp, a: &Lanes, b: &Lanes) -> Lanes {
        match op {
            VectorOp::Add => Self::zip(a, b, ScalarAlu::add),
            VectorOp::Sub => Self::zip(a, b, ScalarAlu::sub),
            VectorOp::Mul => Self::zip(a, b, ScalarAlu::mul),
            VectorOp::Div => Self::zip(a, b, ScalarAlu::div),
            VectorOp::Conj => Self::map(a, ScalarAlu::conj),
        }
    }

    /// Execute a broadcast operation: `op(a[i], s)` for every lane.
    pub fn execute_broadcast(op: BroadcastOp, a: &Lanes, s: Complex) -> Lanes {
        let f = match op {
            BroadcastOp::Add => ScalarAlu::add,
            BroadcastOp::Sub => ScalarAlu::sub,
            BroadcastOp::Mul => ScalarAlu::mul,
            BroadcastOp::Div => ScalarAlu::div,
        };
        Self::map(a, |x| f(x, s))
    }

    /// Execute a reduction to a scalar.
    pub fn execute_reduce(op: ReduceOp, a: &Lanes, b: &Lanes) -> Complex {
        match op {
            ReduceOp::DotConj => Self::dot(a, b),
            ReduceOp::Dot => Self::dotu(a, b),
            ReduceOp::IndexMaxAbs => {
                let (index, _) = Self::max(a);
                Complex::from_int(index as i32, 0)
            }
            ReduceOp::Sum => Self::sum(a),
            ReduceOp::AbsSum => Self::asum(a),
        }
    }

    #[inline]
    fn map(a: &Lanes, f: impl Fn(Complex) -> Complex) -> Lanes {
        let mut out = ZERO_LANES;
        for (o, &x) in out.iter_mut().zip(a) {
            *o = f(x);
        }
        out
    }

    #[inline]
    fn zip(a: &Lanes, b: &Lanes, f: fn(Complex, Complex) -> Complex) -> Lanes {
        let mut out = ZERO_LANES;
        for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
            *o = f(x, y);
        }
        out
    }

    // ========== Reductions ==========

    /// Σ a[i], accumulated in lane order.
    pub fn sum(a: &Lanes) -> Complex {
        a.iter().fold(Complex::ZERO, |acc, &x| ScalarAlu::add(acc, x))
    }

    /// Lane with the greatest magnitude; the first lane wins ties.
    pub fn max(a: &Lanes) -> (usize, Complex) {
        let mut best = (0, a[0]);
        for (i, &x) in a.iter().enumerate().skip(1) {
            if ScalarAlu::magnitude_gt(x, best.1) {
                best = (i, x);
            }
        }
        best
    }

    /// Σ conj(a[i]) · b[i].
    pub fn dot(a: &Lanes, b: &Lanes) -> Complex {
        a.iter().zip(b).fold(Complex::ZERO, |acc, (&x, &y)| {
            ScalarAlu::add(acc, ScalarAlu::mul(ScalarAlu::conj(x), y))
        })
    }

    /// Σ a[i] · b[i].
    pub fn dotu(a: &Lanes, b: &Lanes) -> Complex {
        a.iter().zip(b).fold(Complex::ZERO, |acc, (&x, &y)| {
            ScalarAlu::add(acc, ScalarAlu::mul(x, y))
        })
    }

    /// Σ |a[i]| as a real value.
    pub fn asum(a: &Lanes) -> Complex {
        a.iter()
            .fold(Complex::ZERO, |acc, &x| ScalarAlu::add(acc, ScalarAlu::abs(x)))
    }
}
