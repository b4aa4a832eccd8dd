//! Execution context for one LAPU processor.
//!
//! The `ExecutionContext` holds everything the control unit commits to:
//! register files, matrix banks, program counter, status flags and the
//! current FSM stage. It is owned by the engine and handed to
//! [`ControlUnit::tick`](crate::interpreter::core::ControlUnit::tick) by
//! `&mut` once per tick; nothing else mutates it during a run.

use std::fmt::Write as _;

use crate::interpreter::core::Stage;

use super::matrix::{BankId, MatrixBanks, NUM_BANKS};
use super::registers::{RegIndex, RegisterFile, NUM_SCALAR_REGS, NUM_VECTOR_REGS};

/// Committed processor state.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    // === Control ===
    /// Program counter (word address).
    pc: u32,

    /// The instruction in flight is a taken jump.
    jump_taken: bool,

    /// A decode error stopped the processor.
    error: bool,

    /// The halt sentinel was fetched.
    done: bool,

    /// Current control-unit stage.
    stage: Stage,

    // === Architectural state ===
    /// Scalar and vector registers.
    pub regs: RegisterFile,

    /// The four matrix banks.
    pub matrices: MatrixBanks,

    // === Statistics ===
    /// Ticks since reset.
    pub cycles: u64,

    /// Instructions retired since reset.
    pub instructions: u64,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(super::matrix::DEFAULT_TILE_FACTOR)
    }
}

impl ExecutionContext {
    /// Create a zeroed context whose matrices have `tile_factor` tiles per axis.
    pub fn new(tile_factor: usize) -> Self {
        Self {
            pc: 0,
            jump_taken: false,
            error: false,
            done: false,
            stage: Stage::Idle,
            regs: RegisterFile::new(),
            matrices: MatrixBanks::new(tile_factor),
            cycles: 0,
            instructions: 0,
        }
    }

    /// Program counter.
    #[inline]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Set the program counter.
    #[inline]
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    /// True while the instruction in flight is a taken jump.
    #[inline]
    pub fn jump_taken(&self) -> bool {
        self.jump_taken
    }

    #[inline]
    pub(crate) fn set_jump_taken(&mut self, taken: bool) {
        self.jump_taken = taken;
    }

    /// True once a decode error has stopped the processor.
    #[inline]
    pub fn error(&self) -> bool {
        self.error
    }

    #[inline]
    pub(crate) fn set_error(&mut self) {
        self.error = true;
    }

    /// True once the halt sentinel has been fetched.
    #[inline]
    pub fn done(&self) -> bool {
        self.done
    }

    #[inline]
    pub(crate) fn set_done(&mut self) {
        self.done = true;
    }

    /// Current control-unit stage.
    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[inline]
    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    /// Record one retired instruction.
    #[inline]
    pub fn record_instruction(&mut self) {
        self.instructions += 1;
    }

    /// Ticks per retired instruction.
    pub fn cpi(&self) -> f64 {
        if self.instructions == 0 {
            0.0
        } else {
            self.cycles as f64 / self.instructions as f64
        }
    }

    /// Reset all state (registers, matrices, PC, flags, stats).
    ///
    /// The matrix size is kept.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.jump_taken = false;
        self.error = false;
        self.done = false;
        self.stage = Stage::Idle;
        self.regs.reset();
        self.matrices.reset();
        self.cycles = 0;
        self.instructions = 0;
    }

    /// Render PC, flags and every non-zero register.
    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "stage={} pc={} error={} done={} cycles={} instructions={}",
            self.stage, self.pc, self.error, self.done, self.cycles, self.instructions
        );

        for i in 1..NUM_SCALAR_REGS as u8 {
            let value = self.regs.scalar.read(RegIndex::from_bits(i));
            if !value.is_zero() {
                let _ = writeln!(out, "  s{} = {}", i, value);
            }
        }
        for i in 1..NUM_VECTOR_REGS as u8 {
            let lanes = self.regs.vector.read(RegIndex::from_bits(i));
            if lanes.iter().any(|x| !x.is_zero()) {
                let _ = write!(out, "  v{} = [", i);
                for (lane, value) in lanes.iter().enumerate() {
                    if lane > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}", value);
                }
                out.push_str("]\n");
            }
        }
        out
    }

    /// Render the top-left `size × size` window of every matrix bank.
    pub fn format_matrices(&self, size: usize) -> String {
        (0..NUM_BANKS as u8)
            .filter_map(BankId::new)
            .map(|bank| self.matrices.format_window(bank, size, size))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::fixed::Complex;

    #[test]
    fn test_new_context_is_idle_and_zero() {
        let ctx = ExecutionContext::default();
        assert_eq!(ctx.pc(), 0);
        assert_eq!(ctx.stage(), Stage::Idle);
        assert!(!ctx.error());
        assert!(!ctx.done());
        assert!(!ctx.jump_taken());
        assert_eq!(ctx.matrices.dimension(), 16);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ctx = ExecutionContext::new(1);
        ctx.set_pc(42);
        ctx.set_error();
        ctx.set_done();
        ctx.set_stage(Stage::Error);
        ctx.regs.scalar.write(RegIndex::from_bits(2), Complex::ONE);
        ctx.matrices
            .write_scalar(BankId::new(1).unwrap(), 3, 3, Complex::ONE);
        ctx.cycles = 12;
        ctx.record_instruction();

        ctx.reset();

        assert_eq!(ctx.pc(), 0);
        assert_eq!(ctx.stage(), Stage::Idle);
        assert!(!ctx.error() && !ctx.done());
        assert_eq!(ctx.regs.scalar.read(RegIndex::from_bits(2)), Complex::ZERO);
        assert_eq!(
            ctx.matrices.read_scalar(BankId::new(1).unwrap(), 3, 3),
            Complex::ZERO
        );
        assert_eq!(ctx.cycles, 0);
        assert_eq!(ctx.instructions, 0);
        // Matrix size survives reset
        assert_eq!(ctx.matrices.dimension(), 8);
    }

    #[test]
    fn test_cpi() {
        let mut ctx = ExecutionContext::default();
        assert_eq!(ctx.cpi(), 0.0);
        ctx.cycles = 12;
        ctx.record_instruction();
        ctx.record_instruction();
        assert_eq!(ctx.cpi(), 6.0);
    }

    #[test]
    fn test_format_summary_lists_non_zero() {
        let mut ctx = ExecutionContext::default();
        ctx.regs.scalar.write(RegIndex::from_bits(3), Complex::from_int(-2, 6));

        let text = ctx.format_summary();
        assert!(text.contains("s3 = (-2.000000 +6.000000i)"));
        assert!(!text.contains("s1 ="));
        assert!(!text.contains("v1 ="));
    }

    #[test]
    fn test_format_matrices_covers_all_banks() {
        let ctx = ExecutionContext::default();
        let text = ctx.format_matrices(2);
        for bank in 0..4 {
            assert!(text.contains(&format!("mb{}:", bank)));
        }
    }
}
