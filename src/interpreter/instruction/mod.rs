//! Decoded LAPU instructions.
//!
//! Every instruction is one 128-bit word. The top byte selects the format,
//! the next byte the operation within that format:
//!
//! | Format | Code | Purpose |
//! |--------|------|---------|
//! | R | 0x01 | Scalar/vector ALU, shape chosen by the operand map |
//! | I | 0x02 | Scalar ALU with a complex immediate |
//! | J | 0x03 | Conditional relative jump |
//! | S | 0x04 | Matrix bank load/store |
//!
//! The all-zero word is not an instruction; it is the halt sentinel and is
//! handled by the control unit before decoding.

pub mod encoding;

use std::fmt;

use crate::interpreter::fixed::Complex;
use crate::interpreter::state::{BankId, MajorAxis, RegIndex};

/// Instruction format (bits 127:120).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Register ALU.
    R,
    /// Immediate ALU.
    I,
    /// Conditional relative jump.
    J,
    /// Matrix load/store.
    S,
}

impl Format {
    /// Decode the format byte.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Format::R),
            0x02 => Some(Format::I),
            0x03 => Some(Format::J),
            0x04 => Some(Format::S),
            _ => None,
        }
    }

    /// Format byte.
    pub const fn code(self) -> u8 {
        match self {
            Format::R => 0x01,
            Format::I => 0x02,
            Format::J => 0x03,
            Format::S => 0x04,
        }
    }
}

/// Operand shape of an R-format instruction (bits 97:96).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandMap {
    /// Scalar operands, scalar result.
    ScalarToScalar,
    /// Vector operands, vector result (lane-wise).
    VectorToVector,
    /// Vector operands, scalar result (reduction).
    VectorToScalar,
    /// Vector and scalar operands, vector result (broadcast).
    VectorScalarToVector,
}

impl OperandMap {
    /// Decode the 2-bit map field.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0b00 => OperandMap::ScalarToScalar,
            0b01 => OperandMap::VectorToVector,
            0b10 => OperandMap::VectorToScalar,
            _ => OperandMap::VectorScalarToVector,
        }
    }

    /// 2-bit map field.
    pub const fn bits(self) -> u8 {
        match self {
            OperandMap::ScalarToScalar => 0b00,
            OperandMap::VectorToVector => 0b01,
            OperandMap::VectorToScalar => 0b10,
            OperandMap::VectorScalarToVector => 0b11,
        }
    }
}

/// Declares an opcode enum with its sub-operation codes and mnemonics.
macro_rules! subops {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident = $code:literal => $mnemonic:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every operation of this group.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// Decode a sub-operation byte.
            pub const fn from_code(code: u8) -> Option<Self> {
                match code {
                    $( $code => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Sub-operation byte.
            pub const fn code(self) -> u8 {
                match self {
                    $( $name::$variant => $code, )+
                }
            }

            /// Assembly mnemonic.
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $( $name::$variant => $mnemonic, )+
                }
            }
        }
    };
}

subops! {
    /// Scalar operations (R format, map 00).
    ScalarOp {
        /// -a
        Neg = 0x00 => "cneg",
        /// conj(a)
        Conj = 0x01 => "conj",
        /// Complex square root.
        Sqrt = 0x02 => "csqrt",
        /// |a|² as a real value.
        Abs2 = 0x03 => "cabs2",
        /// |a| as a real value.
        Abs = 0x04 => "cabs",
        /// Real part, imaginary zeroed.
        Real = 0x05 => "creal",
        /// Imaginary part moved to the real slot, imaginary zeroed.
        Imag = 0x06 => "cimag",
        /// 1 / a
        Recip = 0x07 => "crecip",
        Add = 0x08 => "cadd",
        Sub = 0x09 => "csub",
        Mul = 0x0A => "cmul",
        Div = 0x0B => "cdiv",
        /// Operand with the larger magnitude.
        MaxAbs = 0x0C => "cmaxabs",
        /// Operand with the smaller magnitude.
        MinAbs = 0x0D => "cminabs",
        /// re(a) < re(b) as 1.0 or 0.
        LtRe = 0x0E => "cmplt.re",
        /// re(a) > re(b) as 1.0 or 0.
        GtRe = 0x0F => "cmpgt.re",
        /// re(a) <= re(b) as 1.0 or 0.
        LeRe = 0x10 => "cmple.re",
    }
}

impl ScalarOp {
    /// True for operations that only read `rs1`.
    pub const fn is_unary(self) -> bool {
        self.code() <= 0x07
    }
}

subops! {
    /// Lane-wise vector operations (R format, map 01).
    ///
    /// `vmac` (0x03) is reserved: it is recognized by the decoder and
    /// reported as unimplemented.
    VectorOp {
        Add = 0x00 => "vadd",
        Sub = 0x01 => "vsub",
        Mul = 0x02 => "vmul",
        Div = 0x04 => "vdiv",
        Conj = 0x05 => "vconj",
    }
}

/// Reserved sub-operation code of the vector multiply-accumulate.
pub const VMAC_CODE: u8 = 0x03;

subops! {
    /// Vector reductions (R format, map 10).
    ReduceOp {
        /// Σ conj(a[i])·b[i]
        DotConj = 0x00 => "dotc",
        /// Σ a[i]·b[i]
        Dot = 0x01 => "dotu",
        /// Index of the lane with the largest magnitude.
        IndexMaxAbs = 0x02 => "iamax",
        /// Σ a[i]
        Sum = 0x03 => "sum",
        /// Σ |a[i]| as a real value.
        AbsSum = 0x04 => "asum",
    }
}

subops! {
    /// Vector-by-broadcast-scalar operations (R format, map 11).
    BroadcastOp {
        Add = 0x18 => "vsadd",
        Sub = 0x19 => "vssub",
        Mul = 0x1A => "vsmul",
        Div = 0x1B => "vsdiv",
    }
}

subops! {
    /// Immediate operations (I format).
    ImmediateOp {
        /// rd = imm
        Load = 0x00 => "cloadi",
        Add = 0x01 => "cadd_i",
        Mul = 0x02 => "cmul_i",
        Sub = 0x03 => "csub_i",
        Div = 0x04 => "cdiv_i",
        MaxAbs = 0x05 => "cmaxabs_i",
        MinAbs = 0x06 => "cminabs_i",
        /// Scale both components by re(imm).
        Scale = 0x10 => "cscale_i",
    }
}

subops! {
    /// Matrix load/store operations (S format).
    MemoryOp {
        /// Tile load into a vector register.
        VectorLoad = 0x00 => "vld",
        /// Tile store from a vector register.
        VectorStore = 0x01 => "vst",
        /// Element load into a scalar register.
        ScalarLoad = 0x02 => "sld.xy",
        /// Element store from a scalar register.
        ScalarStore = 0x03 => "sst.xy",
    }
}

/// Sub-operation code of the relative jump.
pub const JREL_CODE: u8 = 0x00;

/// A fully decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Scalar ALU: `rd = op(s[rs1], s[rs2])`.
    Scalar {
        op: ScalarOp,
        rd: RegIndex,
        rs1: RegIndex,
        rs2: RegIndex,
    },
    /// Lane-wise vector ALU: `v[rd] = op(v[rs1], v[rs2])`.
    Vector {
        op: VectorOp,
        rd: RegIndex,
        rs1: RegIndex,
        rs2: RegIndex,
    },
    /// Reduction: `s[rd] = op(v[rs1], v[rs2])`.
    Reduce {
        op: ReduceOp,
        rd: RegIndex,
        rs1: RegIndex,
        rs2: RegIndex,
    },
    /// Broadcast: `v[rd] = op(v[rs1], s[rs2])`.
    Broadcast {
        op: BroadcastOp,
        rd: RegIndex,
        rs1: RegIndex,
        rs2: RegIndex,
    },
    /// Immediate ALU: `s[rd] = op(s[rs1], imm)`.
    Immediate {
        op: ImmediateOp,
        rd: RegIndex,
        rs1: RegIndex,
        imm: Complex,
    },
    /// Jump to `PC + offset` when re(s[test]) != 0.
    Jump {
        test: RegIndex,
        offset: i64,
    },
    /// Tile load: `v[rd] = bank[tile, fixed, axis]`.
    VectorLoad {
        rd: RegIndex,
        bank: BankId,
        tile: u16,
        fixed: u16,
        axis: MajorAxis,
    },
    /// Tile store: `bank[tile, fixed, axis] = v[rs]`.
    VectorStore {
        rs: RegIndex,
        bank: BankId,
        tile: u16,
        fixed: u16,
        axis: MajorAxis,
    },
    /// Element load: `s[rd] = bank[row, col]`.
    ScalarLoad {
        rd: RegIndex,
        bank: BankId,
        row: u16,
        col: u16,
    },
    /// Element store: `bank[row, col] = s[rs]`.
    ScalarStore {
        rs: RegIndex,
        bank: BankId,
        row: u16,
        col: u16,
    },
}

impl Instruction {
    /// Format this instruction is encoded in.
    pub const fn format(&self) -> Format {
        match self {
            Instruction::Scalar { .. }
            | Instruction::Vector { .. }
            | Instruction::Reduce { .. }
            | Instruction::Broadcast { .. } => Format::R,
            Instruction::Immediate { .. } => Format::I,
            Instruction::Jump { .. } => Format::J,
            Instruction::VectorLoad { .. }
            | Instruction::VectorStore { .. }
            | Instruction::ScalarLoad { .. }
            | Instruction::ScalarStore { .. } => Format::S,
        }
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Scalar { op, .. } => op.mnemonic(),
            Instruction::Vector { op, .. } => op.mnemonic(),
            Instruction::Reduce { op, .. } => op.mnemonic(),
            Instruction::Broadcast { op, .. } => op.mnemonic(),
            Instruction::Immediate { op, .. } => op.mnemonic(),
            Instruction::Jump { .. } => "jrel",
            Instruction::VectorLoad { axis, .. } => match axis {
                MajorAxis::Row => "vld.rm",
                MajorAxis::Column => "vld.cm",
            },
            Instruction::VectorStore { axis, .. } => match axis {
                MajorAxis::Row => "vst.rm",
                MajorAxis::Column => "vst.cm",
            },
            Instruction::ScalarLoad { .. } => MemoryOp::ScalarLoad.mnemonic(),
            Instruction::ScalarStore { .. } => MemoryOp::ScalarStore.mnemonic(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic();
        match *self {
            Instruction::Scalar { op, rd, rs1, rs2 } => {
                if op.is_unary() {
                    write!(f, "{} s{}, s{}", m, rd, rs1)
                } else {
                    write!(f, "{} s{}, s{}, s{}", m, rd, rs1, rs2)
                }
            }
            Instruction::Vector { op, rd, rs1, rs2 } => {
                if op == VectorOp::Conj {
                    write!(f, "{} v{}, v{}", m, rd, rs1)
                } else {
                    write!(f, "{} v{}, v{}, v{}", m, rd, rs1, rs2)
                }
            }
            Instruction::Reduce { op, rd, rs1, rs2 } => match op {
                ReduceOp::IndexMaxAbs | ReduceOp::Sum | ReduceOp::AbsSum => {
                    write!(f, "{} s{}, v{}", m, rd, rs1)
                }
                ReduceOp::DotConj | ReduceOp::Dot => write!(f, "{} s{}, v{}, v{}", m, rd, rs1, rs2),
            },
            Instruction::Broadcast { rd, rs1, rs2, .. } => {
                write!(f, "{} v{}, v{}, s{}", m, rd, rs1, rs2)
            }
            Instruction::Immediate { op, rd, rs1, imm } => {
                if op == ImmediateOp::Load {
                    write!(f, "{} s{}, {}", m, rd, imm)
                } else {
                    write!(f, "{} s{}, s{}, {}", m, rd, rs1, imm)
                }
            }
            Instruction::Jump { test, offset } => write!(f, "{} s{}, {:+}", m, test, offset),
            Instruction::VectorLoad { rd, bank, tile, fixed, .. } => {
                write!(f, "{} v{}, mb{}, {}, {}", m, rd, bank.get(), fixed, tile)
            }
            Instruction::VectorStore { rs, bank, tile, fixed, .. } => {
                write!(f, "{} v{}, mb{}, {}, {}", m, rs, bank.get(), fixed, tile)
            }
            Instruction::ScalarLoad { rd, bank, row, col } => {
                write!(f, "{} s{}, mb{}, {}, {}", m, rd, bank.get(), col, row)
            }
            Instruction::ScalarStore { rs, bank, row, col } => {
                write!(f, "{} s{}, mb{}, {}, {}", m, rs, bank.get(), col, row)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(i: u8) -> RegIndex {
        RegIndex::new(i).unwrap()
    }

    #[test]
    fn test_format_codes() {
        for format in [Format::R, Format::I, Format::J, Format::S] {
            assert_eq!(Format::from_code(format.code()), Some(format));
        }
        assert_eq!(Format::from_code(0x00), None);
        assert_eq!(Format::from_code(0x05), None);
    }

    #[test]
    fn test_subop_tables() {
        assert_eq!(ScalarOp::from_code(0x0A), Some(ScalarOp::Mul));
        assert_eq!(ScalarOp::from_code(0x11), None);
        assert_eq!(VectorOp::from_code(VMAC_CODE), None);
        assert_eq!(ReduceOp::from_code(0x02), Some(ReduceOp::IndexMaxAbs));
        assert_eq!(BroadcastOp::from_code(0x00), None);
        assert_eq!(ImmediateOp::from_code(0x10), Some(ImmediateOp::Scale));
        assert_eq!(MemoryOp::from_code(0x03), Some(MemoryOp::ScalarStore));

        for op in ScalarOp::ALL {
            assert_eq!(ScalarOp::from_code(op.code()), Some(*op));
        }
    }

    #[test]
    fn test_unary_split() {
        assert!(ScalarOp::Recip.is_unary());
        assert!(!ScalarOp::Add.is_unary());
    }

    #[test]
    fn test_display() {
        let add = Instruction::Scalar { op: ScalarOp::Add, rd: r(3), rs1: r(1), rs2: r(2) };
        assert_eq!(add.to_string(), "cadd s3, s1, s2");

        let jump = Instruction::Jump { test: r(1), offset: -5 };
        assert_eq!(jump.to_string(), "jrel s1, -5");

        let vld = Instruction::VectorLoad {
            rd: r(2),
            bank: BankId::new(1).unwrap(),
            tile: 1,
            fixed: 4,
            axis: MajorAxis::Column,
        };
        assert_eq!(vld.to_string(), "vld.cm v2, mb1, 4, 1");
        assert_eq!(vld.format(), Format::S);
    }
}
