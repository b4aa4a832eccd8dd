//! Table-driven instruction decoder.
//!
//! # How It Works
//!
//! 1. The format byte selects the field layout (R, I, J or S)
//! 2. For R format the operand map selects one of four sub-operation tables
//! 3. Register fields are 3 bits wide and therefore always valid
//! 4. S-format bank ids and coordinates are range-checked against the
//!    configured matrix size, so accepted instructions can never address
//!    outside a bank

use crate::interpreter::instruction::encoding::{
    self, bits, bits_signed, FIELD_A, FIELD_B, FORMAT, JUMP_OFFSET, MAP, MBID, RC, RD, RS1, RS2,
    SUBOP,
};
use crate::interpreter::instruction::{
    BroadcastOp, Format, ImmediateOp, Instruction, MemoryOp, OperandMap, ReduceOp, ScalarOp,
    VectorOp, JREL_CODE, VMAC_CODE,
};
use crate::interpreter::state::{BankId, MajorAxis, RegIndex, DEFAULT_TILE_FACTOR, LANES};
use crate::interpreter::traits::{DecodeError, Decoder};

/// LAPU instruction decoder.
///
/// Holds the matrix geometry so S-format coordinates can be validated.
#[derive(Debug, Clone, Copy)]
pub struct InstructionDecoder {
    tile_factor: usize,
    dim: usize,
}

impl Default for InstructionDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_FACTOR)
    }
}

impl InstructionDecoder {
    /// Create a decoder for matrices with `tile_factor` tiles per axis.
    pub fn new(tile_factor: usize) -> Self {
        let tile_factor = tile_factor.max(1);
        Self {
            tile_factor,
            dim: tile_factor * LANES,
        }
    }

    fn reg(word: u128, field: encoding::Field) -> RegIndex {
        RegIndex::from_bits(bits(word, field) as u8)
    }

    fn decode_r(word: u128, subop: u8, pc: u32) -> Result<Instruction, DecodeError> {
        let rd = Self::reg(word, RD);
        let rs1 = Self::reg(word, RS1);
        let rs2 = Self::reg(word, RS2);

        let unknown = |group: &'static str| DecodeError::UnknownSubop { group, subop, pc };

        match OperandMap::from_bits(bits(word, MAP) as u8) {
            OperandMap::ScalarToScalar => {
                let op = ScalarOp::from_code(subop).ok_or_else(|| unknown("scalar"))?;
                Ok(Instruction::Scalar { op, rd, rs1, rs2 })
            }
            OperandMap::VectorToVector => {
                if subop == VMAC_CODE {
                    return Err(DecodeError::Unimplemented { mnemonic: "vmac", pc });
                }
                let op = VectorOp::from_code(subop).ok_or_else(|| unknown("vector"))?;
                Ok(Instruction::Vector { op, rd, rs1, rs2 })
            }
            OperandMap::VectorToScalar => {
                let op = ReduceOp::from_code(subop).ok_or_else(|| unknown("reduction"))?;
                Ok(Instruction::Reduce { op, rd, rs1, rs2 })
            }
            OperandMap::VectorScalarToVector => {
                let op = BroadcastOp::from_code(subop).ok_or_else(|| unknown("broadcast"))?;
                Ok(Instruction::Broadcast { op, rd, rs1, rs2 })
            }
        }
    }

    fn decode_i(word: u128, subop: u8, pc: u32) -> Result<Instruction, DecodeError> {
        let op = ImmediateOp::from_code(subop).ok_or(DecodeError::UnknownSubop {
            group: "immediate",
            subop,
            pc,
        })?;
        Ok(Instruction::Immediate {
            op,
            rd: Self::reg(word, RD),
            rs1: Self::reg(word, RS1),
            imm: encoding::immediate(word),
        })
    }

    fn decode_j(word: u128, subop: u8, pc: u32) -> Result<Instruction, DecodeError> {
        if subop != JREL_CODE {
            return Err(DecodeError::UnknownSubop { group: "jump", subop, pc });
        }
        Ok(Instruction::Jump {
            test: Self::reg(word, RD),
            offset: bits_signed(word, JUMP_OFFSET),
        })
    }

    fn decode_s(&self, word: u128, subop: u8, pc: u32) -> Result<Instruction, DecodeError> {
        let op = MemoryOp::from_code(subop).ok_or(DecodeError::UnknownSubop {
            group: "memory",
            subop,
            pc,
        })?;

        let raw_bank = bits(word, MBID) as u8;
        let bank = BankId::new(raw_bank).ok_or(DecodeError::BankOutOfRange { bank: raw_bank, pc })?;

        let reg = Self::reg(word, RD);
        let a = bits(word, FIELD_A) as u16;
        let b = bits(word, FIELD_B) as u16;
        let out_of_range = DecodeError::CoordinateOutOfRange { a, b, dim: self.dim, pc };

        match op {
            MemoryOp::VectorLoad | MemoryOp::VectorStore => {
                // A = fixed row/column, B = tile index
                if (a as usize) >= self.dim || (b as usize) >= self.tile_factor {
                    return Err(out_of_range);
                }
                let axis = MajorAxis::from_bit(bits(word, RC) != 0);
                Ok(if op == MemoryOp::VectorLoad {
                    Instruction::VectorLoad { rd: reg, bank, tile: b, fixed: a, axis }
                } else {
                    Instruction::VectorStore { rs: reg, bank, tile: b, fixed: a, axis }
                })
            }
            MemoryOp::ScalarLoad | MemoryOp::ScalarStore => {
                // A = column (x), B = row (y)
                if (a as usize) >= self.dim || (b as usize) >= self.dim {
                    return Err(out_of_range);
                }
                Ok(if op == MemoryOp::ScalarLoad {
                    Instruction::ScalarLoad { rd: reg, bank, row: b, col: a }
                } else {
                    Instruction::ScalarStore { rs: reg, bank, row: b, col: a }
                })
            }
        }
    }
}

impl Decoder for InstructionDecoder {
    fn decode(&self, word: u128, pc: u32) -> Result<Instruction, DecodeError> {
        let format_byte = bits(word, FORMAT) as u8;
        let subop = bits(word, SUBOP) as u8;

        let format = Format::from_code(format_byte).ok_or(DecodeError::UnknownFormat {
            format: format_byte,
            pc,
        })?;

        let instr = match format {
            Format::R => Self::decode_r(word, subop, pc)?,
            Format::I => Self::decode_i(word, subop, pc)?,
            Format::J => Self::decode_j(word, subop, pc)?,
            Format::S => self.decode_s(word, subop, pc)?,
        };

        log::trace!("decode pc={} word=0x{:032X} -> {}", pc, word, instr);
        Ok(instr)
    }
}
