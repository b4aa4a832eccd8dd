//! Bit-level layout of the 128-bit instruction word.
//!
//! ```text
//! 127      120 119      112 111 ... 97 96 95  93 92  90 89  87 ...
//! +----------+------------+-----+-------+------+------+------+----
//! |  format  |   subop    | rc  |  map  |  rd  | rs1  | rs2  |
//! +----------+------------+-----+-------+------+------+------+----
//! ```
//!
//! | Format | Fields |
//! |--------|--------|
//! | R | map 97:96, rd 95:93, rs1 92:90, rs2 89:87 |
//! | I | rd 95:93, rs1 92:90, imm 89:0 = `[re 89:45 | im 44:0]` (Q22.23 each) |
//! | J | test 95:93, offset 92:60 (33-bit signed) |
//! | S | rc 111, reg 95:93, mbid 92:89, field A 88:73, field B 72:57 |
//!
//! For S-format tile ops field A is the fixed row/column and field B the
//! tile index. For element ops field A is the column and field B the row.

use crate::interpreter::fixed::{from_immediate, to_immediate, Complex, IMM_WIDTH};

use super::{Instruction, OperandMap, JREL_CODE, MemoryOp};

/// A `(high, low)` inclusive bit range of the instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub hi: u32,
    pub lo: u32,
}

impl Field {
    const fn new(hi: u32, lo: u32) -> Self {
        Self { hi, lo }
    }

    /// Field width in bits.
    #[inline]
    pub const fn width(self) -> u32 {
        self.hi - self.lo + 1
    }
}

pub const FORMAT: Field = Field::new(127, 120);
pub const SUBOP: Field = Field::new(119, 112);
pub const RC: Field = Field::new(111, 111);
pub const MAP: Field = Field::new(97, 96);
pub const RD: Field = Field::new(95, 93);
pub const RS1: Field = Field::new(92, 90);
pub const RS2: Field = Field::new(89, 87);
pub const IMM_RE: Field = Field::new(89, 45);
pub const IMM_IM: Field = Field::new(44, 0);
pub const JUMP_OFFSET: Field = Field::new(92, 60);
pub const MBID: Field = Field::new(92, 89);
pub const FIELD_A: Field = Field::new(88, 73);
pub const FIELD_B: Field = Field::new(72, 57);

/// Extract an unsigned field.
#[inline]
pub fn bits(word: u128, field: Field) -> u128 {
    let mask = (1u128 << field.width()) - 1;
    (word >> field.lo) & mask
}

/// Extract a two's-complement field, sign-extended to `i64`.
#[inline]
pub fn bits_signed(word: u128, field: Field) -> i64 {
    let shift = 64 - field.width();
    (((bits(word, field) as u64) << shift) as i64) >> shift
}

/// Insert `value` into `field`, truncating it to the field width.
#[inline]
pub fn put_bits(word: u128, field: Field, value: u128) -> u128 {
    let mask = ((1u128 << field.width()) - 1) << field.lo;
    (word & !mask) | ((value << field.lo) & mask)
}

/// Decode the 90-bit complex immediate.
pub fn immediate(word: u128) -> Complex {
    Complex::new(
        from_immediate(bits(word, IMM_RE) as u64),
        from_immediate(bits(word, IMM_IM) as u64),
    )
}

fn header(format: u8, subop: u8) -> u128 {
    let word = put_bits(0, FORMAT, format as u128);
    put_bits(word, SUBOP, subop as u128)
}

fn registers(word: u128, rd: u8, rs1: u8, rs2: u8) -> u128 {
    let word = put_bits(word, RD, rd as u128);
    let word = put_bits(word, RS1, rs1 as u128);
    put_bits(word, RS2, rs2 as u128)
}

fn memory(subop: MemoryOp, rc: bool, reg: u8, bank: u8, a: u16, b: u16) -> u128 {
    let word = header(super::Format::S.code(), subop.code());
    let word = put_bits(word, RC, rc as u128);
    let word = put_bits(word, RD, reg as u128);
    let word = put_bits(word, MBID, bank as u128);
    let word = put_bits(word, FIELD_A, a as u128);
    put_bits(word, FIELD_B, b as u128)
}

impl Instruction {
    /// Encode back into a 128-bit word.
    ///
    /// Immediates are narrowed to Q22.23, so low fractional bits of an
    /// `Immediate` operand are lost. Every other field round-trips exactly.
    pub fn encode(&self) -> u128 {
        let r = super::Format::R.code();
        match *self {
            Instruction::Scalar { op, rd, rs1, rs2 } => {
                let word = put_bits(header(r, op.code()), MAP, OperandMap::ScalarToScalar.bits() as u128);
                registers(word, rd.get(), rs1.get(), rs2.get())
            }
            Instruction::Vector { op, rd, rs1, rs2 } => {
                let word = put_bits(header(r, op.code()), MAP, OperandMap::VectorToVector.bits() as u128);
                registers(word, rd.get(), rs1.get(), rs2.get())
            }
            Instruction::Reduce { op, rd, rs1, rs2 } => {
                let word = put_bits(header(r, op.code()), MAP, OperandMap::VectorToScalar.bits() as u128);
                registers(word, rd.get(), rs1.get(), rs2.get())
            }
            Instruction::Broadcast { op, rd, rs1, rs2 } => {
                let word = put_bits(
                    header(r, op.code()),
                    MAP,
                    OperandMap::VectorScalarToVector.bits() as u128,
                );
                registers(word, rd.get(), rs1.get(), rs2.get())
            }
            Instruction::Immediate { op, rd, rs1, imm } => {
                let word = header(super::Format::I.code(), op.code());
                let word = put_bits(word, RD, rd.get() as u128);
                let word = put_bits(word, RS1, rs1.get() as u128);
                let word = put_bits(word, IMM_RE, to_immediate(imm.re) as u128);
                put_bits(word, IMM_IM, to_immediate(imm.im) as u128)
            }
            Instruction::Jump { test, offset } => {
                let word = header(super::Format::J.code(), JREL_CODE);
                let word = put_bits(word, RD, test.get() as u128);
                put_bits(word, JUMP_OFFSET, offset as u64 as u128)
            }
            Instruction::VectorLoad { rd, bank, tile, fixed, axis } => {
                memory(MemoryOp::VectorLoad, axis.bit(), rd.get(), bank.get(), fixed, tile)
            }
            Instruction::VectorStore { rs, bank, tile, fixed, axis } => {
                memory(MemoryOp::VectorStore, axis.bit(), rs.get(), bank.get(), fixed, tile)
            }
            Instruction::ScalarLoad { rd, bank, row, col } => {
                memory(MemoryOp::ScalarLoad, false, rd.get(), bank.get(), col, row)
            }
            Instruction::ScalarStore { rs, bank, row, col } => {
                memory(MemoryOp::ScalarStore, false, rs.get(), bank.get(), col, row)
            }
        }
    }
}

// Immediate sub-fields must tile the 90-bit slot exactly.
const _: () = assert!(IMM_RE.width() == IMM_WIDTH && IMM_IM.width() == IMM_WIDTH);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::instruction::{ImmediateOp, ScalarOp};
    use crate::interpreter::state::{BankId, MajorAxis, RegIndex};

    fn r(i: u8) -> RegIndex {
        RegIndex::new(i).unwrap()
    }

    #[test]
    fn test_bits_and_put_bits() {
        let word = put_bits(0, RD, 0b101);
        assert_eq!(word, 0b101u128 << 93);
        assert_eq!(bits(word, RD), 0b101);
        // Values wider than the field are truncated
        assert_eq!(bits(put_bits(0, RS1, 0xFF), RS1), 0b111);
        // Untouched neighbours survive
        let word = put_bits(u128::MAX, RS2, 0);
        assert_eq!(bits(word, RS1), 0b111);
        assert_eq!(bits(word, RS2), 0);
    }

    #[test]
    fn test_bits_signed() {
        let word = put_bits(0, JUMP_OFFSET, (-5i64) as u64 as u128);
        assert_eq!(bits_signed(word, JUMP_OFFSET), -5);
        let word = put_bits(0, JUMP_OFFSET, 1 << 31);
        assert_eq!(bits_signed(word, JUMP_OFFSET), 1 << 31);
    }

    #[test]
    fn test_scalar_add_layout() {
        let add = Instruction::Scalar { op: ScalarOp::Add, rd: r(3), rs1: r(1), rs2: r(2) };
        let word = add.encode();

        assert_eq!(bits(word, FORMAT), 0x01);
        assert_eq!(bits(word, SUBOP), 0x08);
        assert_eq!(bits(word, MAP), 0b00);
        assert_eq!(bits(word, RD), 3);
        assert_eq!(bits(word, RS1), 1);
        assert_eq!(bits(word, RS2), 2);
    }

    #[test]
    fn test_immediate_real_in_upper_half() {
        let load = Instruction::Immediate {
            op: ImmediateOp::Load,
            rd: r(1),
            rs1: r(0),
            imm: Complex::from_int(2, -1),
        };
        let word = load.encode();

        assert_eq!(bits(word, IMM_RE), 2 << 23);
        assert_eq!(immediate(word), Complex::from_int(2, -1));
    }

    #[test]
    fn test_memory_field_order() {
        let vld = Instruction::VectorLoad {
            rd: r(2),
            bank: BankId::new(3).unwrap(),
            tile: 1,
            fixed: 9,
            axis: MajorAxis::Column,
        };
        let word = vld.encode();
        assert_eq!(bits(word, RC), 1);
        assert_eq!(bits(word, MBID), 3);
        assert_eq!(bits(word, FIELD_A), 9);
        assert_eq!(bits(word, FIELD_B), 1);

        let sld = Instruction::ScalarLoad { rd: r(1), bank: BankId::new(0).unwrap(), row: 4, col: 7 };
        let word = sld.encode();
        assert_eq!(bits(word, FIELD_A), 7);
        assert_eq!(bits(word, FIELD_B), 4);
    }
}
