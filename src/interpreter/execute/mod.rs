//! Execution units for LAPU operations.
//!
//! | Unit | Operations |
//! |------|------------|
//! | Scalar ALU | Complex arithmetic, magnitude, compare (R map 00 and I format) |
//! | Vector ALU | Lane-wise, broadcast and reduction ops (R maps 01, 10, 11) |
//!
//! Matrix loads/stores and jumps need no arithmetic and are carried out by
//! the control unit directly against the execution context.
//!
//! Both units are stateless: every operation is a pure function of its
//! operands, so the control unit can stage operands in one tick and commit
//! the result in a later one.

mod scalar;
mod vector;

pub use scalar::ScalarAlu;
pub use vector::VectorAlu;
