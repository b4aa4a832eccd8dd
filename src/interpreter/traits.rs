//! Core traits for the interpreter.
//!
//! The control unit is generic over its [`Decoder`], so a recording or
//! fault-injecting decoder can be swapped in for testing without touching
//! the FSM.

use thiserror::Error;

use super::instruction::Instruction;

/// Errors that can occur during instruction decoding.
///
/// Any of these stops the processor in the `Error` stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Format byte is not R, I, J or S.
    #[error("unknown format 0x{format:02X} at PC {pc}")]
    UnknownFormat {
        /// The format byte.
        format: u8,
        /// Program counter where error occurred.
        pc: u32,
    },

    /// Sub-operation is not defined for its format/map.
    #[error("unknown {group} sub-operation 0x{subop:02X} at PC {pc}")]
    UnknownSubop {
        /// Which table was consulted.
        group: &'static str,
        /// The sub-operation byte.
        subop: u8,
        /// Program counter where error occurred.
        pc: u32,
    },

    /// Operation is reserved in the encoding but has no defined semantics.
    #[error("unimplemented instruction {mnemonic} at PC {pc}")]
    Unimplemented {
        /// Mnemonic of the reserved operation.
        mnemonic: &'static str,
        /// Program counter where error occurred.
        pc: u32,
    },

    /// Matrix bank id above 3.
    #[error("matrix bank {bank} out of range at PC {pc}")]
    BankOutOfRange {
        /// The 4-bit bank id.
        bank: u8,
        /// Program counter where error occurred.
        pc: u32,
    },

    /// Matrix coordinate or tile index outside the configured size.
    #[error("matrix coordinate ({a}, {b}) out of range for {dim}x{dim} matrix at PC {pc}")]
    CoordinateOutOfRange {
        /// Field A of the instruction.
        a: u16,
        /// Field B of the instruction.
        b: u16,
        /// Matrix side length.
        dim: usize,
        /// Program counter where error occurred.
        pc: u32,
    },
}

impl DecodeError {
    /// Program counter of the offending instruction.
    pub fn pc(&self) -> u32 {
        match *self {
            DecodeError::UnknownFormat { pc, .. }
            | DecodeError::UnknownSubop { pc, .. }
            | DecodeError::Unimplemented { pc, .. }
            | DecodeError::BankOutOfRange { pc, .. }
            | DecodeError::CoordinateOutOfRange { pc, .. } => pc,
        }
    }
}

/// Trait for instruction decoding.
///
/// Implementations turn one non-zero 128-bit word into an [`Instruction`].
/// The zero word never reaches the decoder; the control unit treats it as
/// the halt sentinel.
///
/// # Example
///
/// ```
/// use lapu_emu::interpreter::decode::InstructionDecoder;
/// use lapu_emu::interpreter::traits::Decoder;
///
/// let decoder = InstructionDecoder::new(2);
/// assert!(decoder.decode(0xFF << 120, 0).is_err());
/// ```
pub trait Decoder {
    /// Decode the word at `pc`.
    ///
    /// `pc` is only used for error reporting.
    fn decode(&self, word: u128, pc: u32) -> Result<Instruction, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let e = DecodeError::UnknownFormat { format: 0x7F, pc: 3 };
        assert_eq!(e.to_string(), "unknown format 0x7F at PC 3");

        let e = DecodeError::Unimplemented { mnemonic: "vmac", pc: 9 };
        assert!(e.to_string().contains("vmac"));
        assert_eq!(e.pc(), 9);

        let e = DecodeError::CoordinateOutOfRange { a: 16, b: 0, dim: 16, pc: 0 };
        assert!(e.to_string().contains("16x16"));
    }
}
