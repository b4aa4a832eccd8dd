//! Instruction decoder for LAPU.
//!
//! Turns raw 128-bit words into [`Instruction`](crate::interpreter::instruction::Instruction)
//! values. See [`instruction::encoding`](crate::interpreter::instruction::encoding)
//! for the field layout.
//!
//! # Example
//!
//! ```
//! use lapu_emu::interpreter::decode::InstructionDecoder;
//! use lapu_emu::interpreter::instruction::{Instruction, ScalarOp};
//! use lapu_emu::interpreter::state::RegIndex;
//! use lapu_emu::interpreter::traits::Decoder;
//!
//! let s = |i| RegIndex::new(i).unwrap();
//! let add = Instruction::Scalar { op: ScalarOp::Add, rd: s(3), rs1: s(1), rs2: s(2) };
//!
//! let decoder = InstructionDecoder::default();
//! assert_eq!(decoder.decode(add.encode(), 0), Ok(add));
//! ```

mod decoder;

pub use decoder::InstructionDecoder;
