//! The LAPU control unit.
//!
//! The control unit ties together the decoder and the execution units. It is
//! a closed state machine advanced one stage per tick:
//!
//! 1. `AddressFetch`: latch PC
//! 2. `InstructionFetch`: read the word; the zero word halts
//! 3. `Decode`: build an [`Instruction`](crate::interpreter::instruction::Instruction)
//! 4. `RegisterSelect`: read sources, evaluate the jump condition
//! 5. `Execute`: run the ALU or read a matrix bank
//! 6. `Writeback`: commit, advance PC
//!
//! # Example
//!
//! ```
//! use lapu_emu::interpreter::core::{ControlUnit, Stage};
//! use lapu_emu::interpreter::state::ExecutionContext;
//! use lapu_emu::program::ProgramMemory;
//!
//! let mut cu = ControlUnit::with_tile_factor(2);
//! let mut ctx = ExecutionContext::default();
//! let program = ProgramMemory::new();
//!
//! cu.signal_start();
//! cu.tick(&mut ctx, &program); // Idle -> AddressFetch
//! cu.tick(&mut ctx, &program); // AddressFetch -> InstructionFetch
//! assert_eq!(cu.tick(&mut ctx, &program), Stage::Done);
//! ```

mod control_unit;
mod stage;

pub use control_unit::ControlUnit;
pub use stage::{Stage, TICKS_PER_INSTRUCTION};
