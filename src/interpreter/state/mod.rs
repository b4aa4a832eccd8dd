//! Processor state for a LAPU core.
//!
//! | Component | Count | Width | Purpose |
//! |-----------|-------|-------|---------|
//! | Scalar | 8 (s0 hardwired zero) | 128-bit complex | ALU operands |
//! | Vector | 8 (v0 hardwired zero) | 8 × 128-bit | Lane-wise ALU operands |
//! | Matrix bank | 4 | N×N complex | Tiled data memory |
//!
//! # Example
//!
//! ```
//! use lapu_emu::interpreter::fixed::Complex;
//! use lapu_emu::interpreter::state::{ExecutionContext, RegIndex};
//!
//! let mut ctx = ExecutionContext::default();
//! let s1 = RegIndex::new(1).unwrap();
//! ctx.regs.scalar.write(s1, Complex::from_int(3, 4));
//! assert_eq!(ctx.regs.scalar.read(s1), Complex::from_int(3, 4));
//! ```

mod context;
mod matrix;
mod registers;

pub use context::ExecutionContext;
pub use matrix::{BankId, MajorAxis, MatrixBanks, DEFAULT_TILE_FACTOR, NUM_BANKS};
pub use registers::{
    Lanes, RegIndex, RegisterFile, ScalarRegisterFile, VectorRegisterFile, LANES,
    NUM_SCALAR_REGS, NUM_VECTOR_REGS, ZERO_LANES,
};
