//! LAPU processor interpreter.
//!
//! A bit-exact model of a fixed-point complex vector processor: 128-bit
//! instructions, Q31.32 complex scalars, 8-lane vector registers and four
//! tiled matrix banks, driven by a six-stage control unit.
//!
//! # Architecture
//!
//! The interpreter is organized into several submodules:
//!
//! - [`fixed`]: Q31.32 arithmetic primitives and the complex scalar
//! - [`instruction`]: Decoded instruction types and the word encoder
//! - [`decode`]: Word-to-instruction decoder
//! - [`execute`]: Execution units (scalar ALU, vector ALU)
//! - [`state`]: Processor state (registers, matrix banks, context)
//! - [`core`]: The control-unit state machine
//! - [`engine`]: Program loading and run control
//!
//! # Example
//!
//! ```
//! use lapu_emu::interpreter::{EngineStatus, LapuEngine};
//! use lapu_emu::program::ProgramMemory;
//!
//! let mut engine = LapuEngine::default();
//! engine.load_program(ProgramMemory::new());
//! assert_eq!(engine.run(100).0, EngineStatus::Halted);
//! ```

pub mod traits;
pub mod fixed;
pub mod instruction;
pub mod decode;
pub mod state;
pub mod execute;
pub mod core;
pub mod engine;

// Re-export key types for convenience
pub use traits::{DecodeError, Decoder};

// Arithmetic types
pub use fixed::Complex;

// Instruction types
pub use instruction::{
    BroadcastOp, Format, ImmediateOp, Instruction, MemoryOp, OperandMap, ReduceOp, ScalarOp,
    VectorOp,
};

// Decoder types
pub use decode::InstructionDecoder;

// State types
pub use state::{
    BankId, ExecutionContext, Lanes, MajorAxis, MatrixBanks, RegIndex, ScalarRegisterFile,
    VectorRegisterFile,
};

// Execute types
pub use execute::{ScalarAlu, VectorAlu};

// Core types
pub use self::core::{ControlUnit, Stage};

// Engine types
pub use engine::{EngineStatus, LapuEngine};
