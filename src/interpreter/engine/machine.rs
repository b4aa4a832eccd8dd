//! Single-processor engine implementation.
//!
//! The engine owns the program memory, the execution context and the
//! control unit, and exposes run control on top of the raw tick.

use crate::config::Config;
use crate::interpreter::core::{ControlUnit, Stage};
use crate::interpreter::state::ExecutionContext;
use crate::interpreter::traits::DecodeError;
use crate::program::ProgramMemory;

/// Engine execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineStatus {
    /// Waiting for start.
    #[default]
    Ready,
    /// Executing instructions.
    Running,
    /// Halt sentinel reached.
    Halted,
    /// Stopped by a decode error.
    Error,
}

impl EngineStatus {
    fn from_stage(stage: Stage) -> Self {
        match stage {
            Stage::Idle => EngineStatus::Ready,
            Stage::Done => EngineStatus::Halted,
            Stage::Error => EngineStatus::Error,
            _ => EngineStatus::Running,
        }
    }

    /// True for `Halted` and `Error`.
    pub fn is_stopped(self) -> bool {
        matches!(self, EngineStatus::Halted | EngineStatus::Error)
    }
}

/// A LAPU processor with its program.
pub struct LapuEngine {
    /// Fetch/decode/execute state machine.
    control: ControlUnit,
    /// Registers, matrices, PC and flags.
    context: ExecutionContext,
    /// Loaded program.
    program: ProgramMemory,
}

impl Default for LapuEngine {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl LapuEngine {
    /// Create an engine whose matrices have `tile_factor` tiles per axis.
    pub fn new(tile_factor: usize) -> Self {
        Self {
            control: ControlUnit::with_tile_factor(tile_factor),
            context: ExecutionContext::new(tile_factor),
            program: ProgramMemory::new(),
        }
    }

    /// Create an engine from configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut engine = Self::new(config.tile_factor());
        engine.control.set_branch_on_imag(config.branch_on_imag());
        engine
    }

    /// Replace the program and reset the processor.
    pub fn load_program(&mut self, program: ProgramMemory) {
        log::info!("Loading program ({} words)", program.len());
        self.program = program;
        self.reset();
    }

    /// Raise the start signal; takes effect on the next step.
    pub fn start(&mut self) {
        self.control.signal_start();
    }

    /// Advance one tick.
    pub fn step(&mut self) -> Stage {
        self.control.tick(&mut self.context, &self.program)
    }

    /// Advance until the current instruction retires or the processor stops.
    ///
    /// From `Idle` this also consumes a pending start. Returns the stage
    /// reached.
    pub fn step_instruction(&mut self) -> Stage {
        let retired = self.context.instructions;
        loop {
            let stage = self.step();
            if stage.is_terminal() || self.context.instructions != retired {
                return stage;
            }
            if stage == Stage::Idle {
                // No start pending
                return stage;
            }
        }
    }

    /// Run for up to `max_cycles` ticks, starting the processor if idle.
    ///
    /// Stops early on halt or error. Returns the final status and the number
    /// of ticks actually executed.
    pub fn run(&mut self, max_cycles: u64) -> (EngineStatus, u64) {
        let start = self.context.cycles;
        if self.context.stage() == Stage::Idle {
            self.start();
        }

        for _ in 0..max_cycles {
            if self.step().is_terminal() {
                break;
            }
        }

        let status = self.status();
        let ticks = self.context.cycles - start;
        match status {
            EngineStatus::Halted => log::info!(
                "Halted after {} ticks, {} instructions",
                ticks,
                self.context.instructions
            ),
            EngineStatus::Error => log::warn!("Stopped on error after {} ticks", ticks),
            _ => log::info!("Tick budget of {} exhausted at PC {}", max_cycles, self.context.pc()),
        }
        (status, ticks)
    }

    /// Reset registers, matrices, PC and flags. The program is kept.
    pub fn reset(&mut self) {
        self.control.signal_reset();
        self.step();
    }

    /// Current status.
    pub fn status(&self) -> EngineStatus {
        EngineStatus::from_stage(self.context.stage())
    }

    /// Committed processor state.
    pub fn state(&self) -> &ExecutionContext {
        &self.context
    }

    /// Mutable processor state, for preloading registers or matrices
    /// before a run.
    pub fn state_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    /// Loaded program.
    pub fn program(&self) -> &ProgramMemory {
        &self.program
    }

    /// The decode error that stopped the processor, if any.
    pub fn last_error(&self) -> Option<&DecodeError> {
        self.control.last_error()
    }

    /// Status line plus every non-zero register.
    pub fn summary(&self) -> String {
        let mut out = format!("status: {:?}\n", self.status());
        if let Some(e) = self.last_error() {
            out.push_str(&format!("error: {}\n", e));
        }
        out.push_str(&self.context.format_summary());
        out
    }
}
