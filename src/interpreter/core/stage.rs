//! Control-unit stages.
//!
//! ```text
//! Idle --start--> AddressFetch --> InstructionFetch --> Decode --> RegisterSelect
//!                      ^                  |                |             |
//!                      |              zero word        bad word          v
//!                  Writeback <---------------------------------------- Execute
//!                                         |                |
//!                                         v                v
//!                                        Done            Error
//! ```
//!
//! Every non-terminal stage takes one tick, so each instruction costs six
//! ticks from `AddressFetch` back to `AddressFetch`. `Error` and `Done` are
//! absorbing; only reset leaves them (reset may leave any stage).

use std::fmt;

/// One state of the control-unit FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    /// Waiting for the start signal.
    #[default]
    Idle,
    /// Latch PC as the fetch address.
    AddressFetch,
    /// Read the instruction word.
    InstructionFetch,
    /// Split the word into fields and validate them.
    Decode,
    /// Read source registers, evaluate the jump condition.
    RegisterSelect,
    /// Run the ALU or access a matrix bank; compute the next PC.
    Execute,
    /// Commit the result and advance PC.
    Writeback,
    /// Stopped by a decode error.
    Error,
    /// Stopped by the halt sentinel.
    Done,
}

/// Number of ticks one instruction spends between two `AddressFetch` stages.
pub const TICKS_PER_INSTRUCTION: u64 = 6;

impl Stage {
    /// Stages reachable from `self` in one tick, excluding reset.
    pub const fn successors(self) -> &'static [Stage] {
        match self {
            Stage::Idle => &[Stage::Idle, Stage::AddressFetch],
            Stage::AddressFetch => &[Stage::InstructionFetch],
            Stage::InstructionFetch => &[Stage::Decode, Stage::Done],
            Stage::Decode => &[Stage::RegisterSelect, Stage::Error],
            Stage::RegisterSelect => &[Stage::Execute],
            Stage::Execute => &[Stage::Writeback],
            Stage::Writeback => &[Stage::AddressFetch],
            Stage::Error => &[Stage::Error],
            Stage::Done => &[Stage::Done],
        }
    }

    /// True if `next` is a legal one-tick successor.
    pub fn can_transition_to(self, next: Stage) -> bool {
        self.successors().contains(&next)
    }

    /// True for `Error` and `Done`.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Stage::Error | Stage::Done)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::AddressFetch => "address-fetch",
            Stage::InstructionFetch => "instruction-fetch",
            Stage::Decode => "decode",
            Stage::RegisterSelect => "register-select",
            Stage::Execute => "execute",
            Stage::Writeback => "writeback",
            Stage::Error => "error",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Stage; 9] = [
        Stage::Idle,
        Stage::AddressFetch,
        Stage::InstructionFetch,
        Stage::Decode,
        Stage::RegisterSelect,
        Stage::Execute,
        Stage::Writeback,
        Stage::Error,
        Stage::Done,
    ];

    #[test]
    fn test_terminal_stages_absorb() {
        for stage in ALL {
            if stage.is_terminal() {
                assert_eq!(stage.successors(), &[stage]);
            } else {
                assert!(!stage.successors().is_empty());
            }
        }
    }

    #[test]
    fn test_instruction_cycle_length() {
        // Follow the non-faulting path from AddressFetch back to itself
        let mut stage = Stage::AddressFetch;
        let mut ticks = 0;
        loop {
            stage = stage.successors()[0];
            ticks += 1;
            if stage == Stage::AddressFetch {
                break;
            }
        }
        assert_eq!(ticks, TICKS_PER_INSTRUCTION);
    }

    #[test]
    fn test_only_fetch_and_decode_can_stop() {
        for stage in ALL {
            let stops = stage.can_transition_to(Stage::Done) || stage.can_transition_to(Stage::Error);
            let expected = matches!(
                stage,
                Stage::InstructionFetch | Stage::Decode | Stage::Error | Stage::Done
            );
            assert_eq!(stops, expected, "{}", stage);
        }
    }
}
