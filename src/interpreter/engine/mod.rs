//! Processor engine.
//!
//! The `LapuEngine` owns one processor (control unit plus execution context)
//! and its program memory, and provides a unified interface for the CLI and
//! for tests.
//!
//! # Execution Model
//!
//! `step` advances one tick. `run` ticks until the processor halts, hits a
//! decode error, or the tick budget runs out; the budget is the only bound
//! on a run, since a program can loop forever.
//!
//! # Example
//!
//! ```
//! use lapu_emu::interpreter::engine::{EngineStatus, LapuEngine};
//! use lapu_emu::interpreter::fixed::Complex;
//! use lapu_emu::interpreter::instruction::{ImmediateOp, Instruction};
//! use lapu_emu::interpreter::state::RegIndex;
//! use lapu_emu::program::ProgramMemory;
//!
//! let s1 = RegIndex::new(1).unwrap();
//! let load = Instruction::Immediate {
//!     op: ImmediateOp::Load,
//!     rd: s1,
//!     rs1: RegIndex::ZERO,
//!     imm: Complex::from_int(3, -1),
//! };
//!
//! let mut engine = LapuEngine::default();
//! engine.load_program(ProgramMemory::from_words(&[load.encode()]).unwrap());
//!
//! let (status, _ticks) = engine.run(1000);
//! assert_eq!(status, EngineStatus::Halted);
//! assert_eq!(engine.state().regs.scalar.read(s1), Complex::from_int(3, -1));
//! ```

mod machine;

pub use machine::{EngineStatus, LapuEngine};
