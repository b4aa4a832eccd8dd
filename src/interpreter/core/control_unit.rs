//! Control-unit implementation.
//!
//! The control unit advances the FSM by exactly one stage per [`tick`].
//! Work done in one stage is carried to the next through latches held on
//! the control unit; architectural state in the [`ExecutionContext`] is only
//! written in `Writeback` (plus the status flags set by `InstructionFetch`
//! and `Decode`).
//!
//! [`tick`]: ControlUnit::tick

use crate::interpreter::decode::InstructionDecoder;
use crate::interpreter::execute::{ScalarAlu, VectorAlu};
use crate::interpreter::fixed::Complex;
use crate::interpreter::instruction::Instruction;
use crate::interpreter::state::{BankId, ExecutionContext, Lanes, MajorAxis, RegIndex};
use crate::interpreter::traits::{DecodeError, Decoder};
use crate::program::ProgramMemory;

use super::stage::Stage;

/// Source values staged in `RegisterSelect`.
#[derive(Debug, Clone, Copy, Default)]
struct Operands {
    /// First scalar source (or store data, or jump test value).
    a: Complex,
    /// Second scalar source (or broadcast scalar).
    b: Complex,
    /// First vector source (or store data).
    va: Lanes,
    /// Second vector source.
    vb: Lanes,
}

/// Result computed in `Execute`, applied in `Writeback`.
#[derive(Debug, Clone, Copy, Default)]
enum Commit {
    /// Nothing to write (jumps).
    #[default]
    None,
    Scalar(RegIndex, Complex),
    Vector(RegIndex, Lanes),
    MatrixScalar {
        bank: BankId,
        row: usize,
        col: usize,
        value: Complex,
    },
    MatrixVector {
        bank: BankId,
        tile: usize,
        fixed: usize,
        axis: MajorAxis,
        values: Lanes,
    },
}

/// The LAPU fetch/decode/execute/writeback state machine.
///
/// Generic over the decoder so tests can substitute their own.
pub struct ControlUnit<D = InstructionDecoder>
where
    D: Decoder,
{
    /// Instruction decoder.
    decoder: D,
    /// Jump on a non-zero imaginary part as well as the real part.
    branch_on_imag: bool,

    // === Input signals, consumed on the next tick ===
    start_pending: bool,
    reset_pending: bool,

    // === Stage latches ===
    fetch_addr: u32,
    word: u128,
    instruction: Option<Instruction>,
    operands: Operands,
    commit: Commit,
    next_pc: u32,

    /// Last decode error (for inspection after `Error`).
    last_error: Option<DecodeError>,
}

impl ControlUnit<InstructionDecoder> {
    /// Create a control unit with the standard decoder for `tile_factor`.
    pub fn with_tile_factor(tile_factor: usize) -> Self {
        Self::new(InstructionDecoder::new(tile_factor))
    }
}

impl<D> ControlUnit<D>
where
    D: Decoder,
{
    /// Create a control unit around `decoder`.
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            branch_on_imag: false,
            start_pending: false,
            reset_pending: false,
            fetch_addr: 0,
            word: 0,
            instruction: None,
            operands: Operands::default(),
            commit: Commit::None,
            next_pc: 0,
            last_error: None,
        }
    }

    /// Make jumps test the imaginary part as well as the real part.
    pub fn set_branch_on_imag(&mut self, enabled: bool) {
        self.branch_on_imag = enabled;
    }

    /// Raise the start signal. Only honoured in `Idle`.
    pub fn signal_start(&mut self) {
        self.start_pending = true;
    }

    /// Raise the reset signal. Honoured in every stage.
    pub fn signal_reset(&mut self) {
        self.reset_pending = true;
    }

    /// The decode error that stopped the processor, if any.
    pub fn last_error(&self) -> Option<&DecodeError> {
        self.last_error.as_ref()
    }

    /// The instruction currently in flight.
    pub fn current_instruction(&self) -> Option<&Instruction> {
        self.instruction.as_ref()
    }

    /// Advance the FSM by one stage and return the new stage.
    pub fn tick(&mut self, ctx: &mut ExecutionContext, program: &ProgramMemory) -> Stage {
        if self.reset_pending {
            self.reset(ctx);
            return Stage::Idle;
        }

        let start = std::mem::take(&mut self.start_pending);
        let stage = ctx.stage();

        let next = match stage {
            Stage::Idle => {
                if start {
                    log::info!("Start at PC {}", ctx.pc());
                    Stage::AddressFetch
                } else {
                    Stage::Idle
                }
            }
            Stage::AddressFetch => {
                self.fetch_addr = ctx.pc();
                Stage::InstructionFetch
            }
            Stage::InstructionFetch => {
                self.word = program.fetch(self.fetch_addr);
                if self.word == 0 {
                    log::info!(
                        "Halt at PC {} after {} instructions",
                        self.fetch_addr,
                        ctx.instructions
                    );
                    ctx.set_done();
                    Stage::Done
                } else {
                    Stage::Decode
                }
            }
            Stage::Decode => match self.decoder.decode(self.word, self.fetch_addr) {
                Ok(instr) => {
                    log::debug!("[{:03}] {}", self.fetch_addr, instr);
                    self.instruction = Some(instr);
                    Stage::RegisterSelect
                }
                Err(e) => {
                    log::warn!("Decode error: {}", e);
                    self.last_error = Some(e);
                    ctx.set_error();
                    Stage::Error
                }
            },
            Stage::RegisterSelect => match self.instruction {
                Some(instr) => {
                    self.select_registers(&instr, ctx);
                    Stage::Execute
                }
                None => Self::missing_instruction(stage, ctx),
            },
            Stage::Execute => match self.instruction {
                Some(instr) => {
                    self.execute(&instr, ctx);
                    Stage::Writeback
                }
                None => Self::missing_instruction(stage, ctx),
            },
            Stage::Writeback => {
                self.writeback(ctx);
                Stage::AddressFetch
            }
            Stage::Error | Stage::Done => stage,
        };

        debug_assert!(
            stage.can_transition_to(next) || next == Stage::Error,
            "illegal transition {} -> {}",
            stage,
            next
        );

        if next != stage {
            log::trace!("stage {} -> {}", stage, next);
        }
        ctx.cycles += 1;
        ctx.set_stage(next);
        next
    }

    /// Reset the processor and every latch.
    fn reset(&mut self, ctx: &mut ExecutionContext) {
        log::debug!("Reset from {}", ctx.stage());
        ctx.reset();
        self.start_pending = false;
        self.reset_pending = false;
        self.fetch_addr = 0;
        self.word = 0;
        self.instruction = None;
        self.operands = Operands::default();
        self.commit = Commit::None;
        self.next_pc = 0;
        self.last_error = None;
    }

    /// Latches are inconsistent with the stage; stop rather than guess.
    fn missing_instruction(stage: Stage, ctx: &mut ExecutionContext) -> Stage {
        log::error!("No decoded instruction latched in {}", stage);
        ctx.set_error();
        Stage::Error
    }

    // ========== Stage Bodies ==========

    /// Stage source operands and evaluate the jump condition.
    fn select_registers(&mut self, instr: &Instruction, ctx: &mut ExecutionContext) {
        let scalar = &ctx.regs.scalar;
        let vector = &ctx.regs.vector;
        let mut ops = Operands::default();
        let mut taken = false;

        match *instr {
            Instruction::Scalar { rs1, rs2, .. } => {
                ops.a = scalar.read(rs1);
                ops.b = scalar.read(rs2);
            }
            Instruction::Vector { rs1, rs2, .. } | Instruction::Reduce { rs1, rs2, .. } => {
                ops.va = vector.read(rs1);
                ops.vb = vector.read(rs2);
            }
            Instruction::Broadcast { rs1, rs2, .. } => {
                ops.va = vector.read(rs1);
                ops.b = scalar.read(rs2);
            }
            Instruction::Immediate { rs1, .. } => {
                ops.a = scalar.read(rs1);
            }
            Instruction::Jump { test, .. } => {
                ops.a = scalar.read(test);
                taken = ops.a.re != 0 || (self.branch_on_imag && ops.a.im != 0);
            }
            Instruction::VectorStore { rs, .. } => {
                ops.va = vector.read(rs);
            }
            Instruction::ScalarStore { rs, .. } => {
                ops.a = scalar.read(rs);
            }
            Instruction::VectorLoad { .. } | Instruction::ScalarLoad { .. } => {}
        }

        log::trace!("operands a={} b={} taken={}", ops.a, ops.b, taken);
        self.operands = ops;
        ctx.set_jump_taken(taken);
    }

    /// Compute the result and the next PC.
    fn execute(&mut self, instr: &Instruction, ctx: &ExecutionContext) {
        let ops = &self.operands;

        self.commit = match *instr {
            Instruction::Scalar { op, rd, .. } => Commit::Scalar(rd, ScalarAlu::execute(op, ops.a, ops.b)),
            Instruction::Vector { op, rd, .. } => {
                Commit::Vector(rd, VectorAlu::execute(op, &ops.va, &ops.vb))
            }
            Instruction::Reduce { op, rd, .. } => {
                Commit::Scalar(rd, VectorAlu::execute_reduce(op, &ops.va, &ops.vb))
            }
            Instruction::Broadcast { op, rd, .. } => {
                Commit::Vector(rd, VectorAlu::execute_broadcast(op, &ops.va, ops.b))
            }
            Instruction::Immediate { op, rd, imm, .. } => {
                Commit::Scalar(rd, ScalarAlu::execute_immediate(op, ops.a, imm))
            }
            Instruction::Jump { .. } => Commit::None,
            Instruction::VectorLoad { rd, bank, tile, fixed, axis } => Commit::Vector(
                rd,
                ctx.matrices.read_vector(bank, tile as usize, fixed as usize, axis),
            ),
            Instruction::VectorStore { bank, tile, fixed, axis, .. } => Commit::MatrixVector {
                bank,
                tile: tile as usize,
                fixed: fixed as usize,
                axis,
                values: ops.va,
            },
            Instruction::ScalarLoad { rd, bank, row, col } => {
                Commit::Scalar(rd, ctx.matrices.read_scalar(bank, row as usize, col as usize))
            }
            Instruction::ScalarStore { bank, row, col, .. } => Commit::MatrixScalar {
                bank,
                row: row as usize,
                col: col as usize,
                value: ops.a,
            },
        };

        self.next_pc = match *instr {
            Instruction::Jump { offset, .. } if ctx.jump_taken() => {
                let target = (self.fetch_addr as i64).wrapping_add(offset) as u32;
                log::debug!("Jump taken {} -> {}", self.fetch_addr, target);
                target
            }
            _ => self.fetch_addr.wrapping_add(1),
        };
    }

    /// Commit the result, advance PC and clear transient state.
    fn writeback(&mut self, ctx: &mut ExecutionContext) {
        match std::mem::take(&mut self.commit) {
            Commit::None => {}
            Commit::Scalar(rd, value) => {
                log::trace!("s{} <- {}", rd, value);
                ctx.regs.scalar.write(rd, value);
            }
            Commit::Vector(rd, values) => {
                log::trace!("v{} <- {:?}", rd, values);
                ctx.regs.vector.write(rd, values);
            }
            Commit::MatrixScalar { bank, row, col, value } => {
                ctx.matrices.write_scalar(bank, row, col, value);
            }
            Commit::MatrixVector { bank, tile, fixed, axis, values } => {
                ctx.matrices.write_vector(bank, tile, fixed, axis, &values);
            }
        }

        ctx.set_pc(self.next_pc);
        ctx.set_jump_taken(false);
        ctx.record_instruction();
        self.instruction = None;
        self.operands = Operands::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::core::stage::TICKS_PER_INSTRUCTION;
    use crate::interpreter::instruction::{ImmediateOp, ScalarOp};

    fn r(i: u8) -> RegIndex {
        RegIndex::new(i).unwrap()
    }

    fn load_imm(rd: u8, re: i32, im: i32) -> u128 {
        Instruction::Immediate {
            op: ImmediateOp::Load,
            rd: r(rd),
            rs1: r(0),
            imm: Complex::from_int(re, im),
        }
        .encode()
    }

    fn setup(words: &[u128]) -> (ControlUnit, ExecutionContext, ProgramMemory) {
        (
            ControlUnit::with_tile_factor(2),
            ExecutionContext::default(),
            ProgramMemory::from_words(words).unwrap(),
        )
    }

    /// Tick until a terminal stage, with a safety bound.
    fn run(cu: &mut ControlUnit, ctx: &mut ExecutionContext, program: &ProgramMemory) -> Stage {
        cu.signal_start();
        for _ in 0..10_000 {
            let stage = cu.tick(ctx, program);
            if stage.is_terminal() {
                return stage;
            }
        }
        panic!("program did not stop");
    }

    // ========== Sequencing Tests ==========

    #[test]
    fn test_idle_waits_for_start() {
        let (mut cu, mut ctx, program) = setup(&[load_imm(1, 1, 0)]);
        for _ in 0..3 {
            assert_eq!(cu.tick(&mut ctx, &program), Stage::Idle);
        }
        cu.signal_start();
        assert_eq!(cu.tick(&mut ctx, &program), Stage::AddressFetch);
    }

    #[test]
    fn test_six_ticks_per_instruction() {
        let (mut cu, mut ctx, program) = setup(&[load_imm(1, 1, 2), load_imm(2, 3, 4)]);
        cu.signal_start();
        assert_eq!(cu.tick(&mut ctx, &program), Stage::AddressFetch);

        let expected = [
            Stage::InstructionFetch,
            Stage::Decode,
            Stage::RegisterSelect,
            Stage::Execute,
            Stage::Writeback,
            Stage::AddressFetch,
        ];
        for stage in expected {
            assert_eq!(cu.tick(&mut ctx, &program), stage);
        }
        assert_eq!(expected.len() as u64, TICKS_PER_INSTRUCTION);
        assert_eq!(ctx.instructions, 1);
        assert_eq!(ctx.pc(), 1);
        assert_eq!(ctx.regs.scalar.read(r(1)), Complex::from_int(1, 2));
        // The second instruction has not committed yet
        assert_eq!(ctx.regs.scalar.read(r(2)), Complex::ZERO);
    }

    #[test]
    fn test_writeback_is_the_only_commit_point() {
        let (mut cu, mut ctx, program) = setup(&[load_imm(3, 5, 5)]);
        cu.signal_start();
        // Idle -> AF -> IF -> D -> RS -> E
        for _ in 0..5 {
            cu.tick(&mut ctx, &program);
        }
        assert_eq!(ctx.stage(), Stage::Execute);
        assert_eq!(ctx.regs.scalar.read(r(3)), Complex::ZERO);
        assert_eq!(ctx.pc(), 0);

        assert_eq!(cu.tick(&mut ctx, &program), Stage::Writeback);
        assert_eq!(ctx.regs.scalar.read(r(3)), Complex::from_int(5, 5));
        assert_eq!(ctx.pc(), 1);
    }

    #[test]
    fn test_zero_word_halts_with_pc_frozen() {
        let (mut cu, mut ctx, program) = setup(&[load_imm(1, 7, 0)]);
        assert_eq!(run(&mut cu, &mut ctx, &program), Stage::Done);
        assert!(ctx.done());
        assert!(!ctx.error());
        assert_eq!(ctx.pc(), 1);

        for _ in 0..10 {
            assert_eq!(cu.tick(&mut ctx, &program), Stage::Done);
        }
        assert_eq!(ctx.pc(), 1);
        assert_eq!(ctx.instructions, 1);
    }

    #[test]
    fn test_empty_program_halts_immediately() {
        let (mut cu, mut ctx, program) = setup(&[]);
        assert_eq!(run(&mut cu, &mut ctx, &program), Stage::Done);
        assert_eq!(ctx.pc(), 0);
        // Idle -> AddressFetch -> InstructionFetch -> Done
        assert_eq!(ctx.cycles, 3);
    }

    #[test]
    fn test_zero_register_write_dropped() {
        let add = Instruction::Scalar { op: ScalarOp::Add, rd: r(2), rs1: r(0), rs2: r(0) }.encode();
        let (mut cu, mut ctx, program) = setup(&[load_imm(0, 99, 1), add]);
        run(&mut cu, &mut ctx, &program);

        assert_eq!(ctx.regs.scalar.read(r(0)), Complex::ZERO);
        assert_eq!(ctx.regs.scalar.read(r(2)), Complex::ZERO);
    }

    // ========== Jump Tests ==========

    fn jump_from_ten(test_value: Complex, branch_on_imag: bool) -> u32 {
        let mut words = vec![load_imm(7, 0, 0); 16];
        words[10] = Instruction::Jump { test: r(1), offset: -5 }.encode();

        let (mut cu, mut ctx, program) = setup(&words);
        cu.set_branch_on_imag(branch_on_imag);
        ctx.regs.scalar.write(r(1), test_value);
        ctx.set_pc(10);

        cu.signal_start();
        // Idle -> AddressFetch, then one full instruction
        for _ in 0..=TICKS_PER_INSTRUCTION {
            cu.tick(&mut ctx, &program);
        }
        assert_eq!(ctx.stage(), Stage::AddressFetch);
        assert!(!ctx.jump_taken());
        ctx.pc()
    }

    #[test]
    fn test_jump_taken_and_not_taken() {
        assert_eq!(jump_from_ten(Complex::from_int(1, 0), false), 5);
        assert_eq!(jump_from_ten(Complex::ZERO, false), 11);
    }

    #[test]
    fn test_jump_tests_real_part_only_by_default() {
        assert_eq!(jump_from_ten(Complex::from_int(0, 1), false), 11);
        assert_eq!(jump_from_ten(Complex::from_int(0, 1), true), 5);
    }

    #[test]
    fn test_jump_flag_visible_during_execute() {
        let (mut cu, mut ctx, program) =
            setup(&[load_imm(1, 1, 0), Instruction::Jump { test: r(1), offset: 0 }.encode()]);
        cu.signal_start();
        // First instruction plus the start tick
        for _ in 0..=TICKS_PER_INSTRUCTION {
            cu.tick(&mut ctx, &program);
        }
        // AF -> IF -> D -> RS
        for _ in 0..3 {
            cu.tick(&mut ctx, &program);
        }
        assert_eq!(ctx.stage(), Stage::RegisterSelect);
        assert!(ctx.jump_taken());
    }

    // ========== Error and Reset Tests ==========

    #[test]
    fn test_decode_error_is_terminal() {
        let bad = 0x7Fu128 << 120;
        let (mut cu, mut ctx, program) = setup(&[load_imm(1, 1, 0), bad]);

        assert_eq!(run(&mut cu, &mut ctx, &program), Stage::Error);
        assert!(ctx.error());
        assert_eq!(ctx.pc(), 1);
        assert_eq!(
            cu.last_error(),
            Some(&DecodeError::UnknownFormat { format: 0x7F, pc: 1 })
        );

        cu.signal_start();
        assert_eq!(cu.tick(&mut ctx, &program), Stage::Error);
    }

    #[test]
    fn test_reset_from_error_returns_to_idle() {
        let bad = 0x7Fu128 << 120;
        let (mut cu, mut ctx, program) = setup(&[load_imm(1, 1, 0), bad]);
        run(&mut cu, &mut ctx, &program);

        cu.signal_reset();
        assert_eq!(cu.tick(&mut ctx, &program), Stage::Idle);
        assert_eq!(ctx.stage(), Stage::Idle);
        assert!(!ctx.error());
        assert_eq!(ctx.pc(), 0);
        assert_eq!(ctx.regs.scalar.read(r(1)), Complex::ZERO);
        assert!(cu.last_error().is_none());

        // Runs again from the top
        assert_eq!(run(&mut cu, &mut ctx, &program), Stage::Error);
        assert_eq!(ctx.regs.scalar.read(r(1)), Complex::from_int(1, 0));
    }

    #[test]
    fn test_reset_mid_instruction_discards_it() {
        let (mut cu, mut ctx, program) = setup(&[load_imm(1, 1, 0)]);
        cu.signal_start();
        for _ in 0..4 {
            cu.tick(&mut ctx, &program);
        }
        assert_eq!(ctx.stage(), Stage::RegisterSelect);

        cu.signal_reset();
        cu.signal_start();
        assert_eq!(cu.tick(&mut ctx, &program), Stage::Idle);
        // The start raised alongside reset is dropped
        assert_eq!(cu.tick(&mut ctx, &program), Stage::Idle);
        assert!(cu.current_instruction().is_none());
        assert_eq!(ctx.regs.scalar.read(r(1)), Complex::ZERO);
    }
}
