//! Register file implementations for LAPU.
//!
//! LAPU has two register files:
//!
//! - **Scalar**: 8 × complex registers (s0-s7)
//! - **Vector**: 8 × 8-lane complex registers (v0-v7)
//!
//! Index 0 of each file is the architectural zero. It has no storage cell:
//! reads are answered with zero and writes are dropped, so no sequence of
//! writes can make s0 or v0 observable as anything else.

use std::fmt;

use crate::interpreter::fixed::Complex;

/// Number of scalar registers, including the hardwired s0.
pub const NUM_SCALAR_REGS: usize = 8;

/// Number of vector registers, including the hardwired v0.
pub const NUM_VECTOR_REGS: usize = 8;

/// Lanes per vector register.
pub const LANES: usize = 8;

/// Contents of one vector register.
pub type Lanes = [Complex; LANES];

/// All-zero vector.
pub const ZERO_LANES: Lanes = [Complex::ZERO; LANES];

/// A 3-bit register index (0-7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RegIndex(u8);

impl RegIndex {
    /// The hardwired zero register.
    pub const ZERO: RegIndex = RegIndex(0);

    /// Create an index, rejecting values above 7.
    pub const fn new(index: u8) -> Option<Self> {
        if index < 8 {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Create an index from the low 3 bits of a field.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x07)
    }

    /// Raw index value.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// True for the hardwired zero register.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Storage slot for a non-zero index.
    #[inline]
    fn slot(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for RegIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scalar complex register file (s0-s7).
#[derive(Clone)]
pub struct ScalarRegisterFile {
    /// Storage for s1-s7.
    regs: [Complex; NUM_SCALAR_REGS - 1],
}

impl Default for ScalarRegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarRegisterFile {
    /// Create a new zeroed register file.
    pub const fn new() -> Self {
        Self {
            regs: [Complex::ZERO; NUM_SCALAR_REGS - 1],
        }
    }

    /// Read a register. s0 always reads as zero.
    #[inline]
    pub fn read(&self, reg: RegIndex) -> Complex {
        match reg.slot() {
            Some(slot) => self.regs[slot],
            None => Complex::ZERO,
        }
    }

    /// Write a register. Writes to s0 are dropped.
    #[inline]
    pub fn write(&mut self, reg: RegIndex, value: Complex) {
        if let Some(slot) = reg.slot() {
            self.regs[slot] = value;
        }
    }

    /// Clear every register.
    pub fn reset(&mut self) {
        self.regs = [Complex::ZERO; NUM_SCALAR_REGS - 1];
    }
}

impl fmt::Debug for ScalarRegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only show non-zero registers
        let non_zero: Vec<_> = self
            .regs
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_zero())
            .collect();

        if non_zero.is_empty() {
            write!(f, "ScalarRegisterFile {{ all zero }}")
        } else {
            write!(f, "ScalarRegisterFile {{ ")?;
            for (i, (slot, val)) in non_zero.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "s{}: {}", slot + 1, val)?;
            }
            write!(f, " }}")
        }
    }
}

/// Vector register file (v0-v7), 8 complex lanes per register.
#[derive(Clone)]
pub struct VectorRegisterFile {
    /// Storage for v1-v7.
    regs: [Lanes; NUM_VECTOR_REGS - 1],
}

impl Default for VectorRegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorRegisterFile {
    /// Create a new zeroed register file.
    pub const fn new() -> Self {
        Self {
            regs: [ZERO_LANES; NUM_VECTOR_REGS - 1],
        }
    }

    /// Read all lanes of a register. v0 always reads as zero.
    #[inline]
    pub fn read(&self, reg: RegIndex) -> Lanes {
        match reg.slot() {
            Some(slot) => self.regs[slot],
            None => ZERO_LANES,
        }
    }

    /// Read a single lane (0-7).
    #[inline]
    pub fn read_lane(&self, reg: RegIndex, lane: usize) -> Complex {
        self.read(reg)[lane % LANES]
    }

    /// Replace all lanes of a register at once. Writes to v0 are dropped.
    #[inline]
    pub fn write(&mut self, reg: RegIndex, value: Lanes) {
        if let Some(slot) = reg.slot() {
            self.regs[slot] = value;
        }
    }

    /// Clear every register.
    pub fn reset(&mut self) {
        self.regs = [ZERO_LANES; NUM_VECTOR_REGS - 1];
    }
}

impl fmt::Debug for VectorRegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let non_zero: Vec<_> = self
            .regs
            .iter()
            .enumerate()
            .filter(|(_, v)| v.iter().any(|x| !x.is_zero()))
            .collect();

        if non_zero.is_empty() {
            write!(f, "VectorRegisterFile {{ all zero }}")
        } else {
            writeln!(f, "VectorRegisterFile {{")?;
            for (slot, val) in non_zero {
                write!(f, "  v{}: [", slot + 1)?;
                for (i, lane) in val.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", lane)?;
                }
                writeln!(f, "]")?;
            }
            write!(f, "}}")
        }
    }
}

/// Both register files of one processor.
#[derive(Clone, Default, Debug)]
pub struct RegisterFile {
    /// Scalar registers.
    pub scalar: ScalarRegisterFile,
    /// Vector registers.
    pub vector: VectorRegisterFile,
}

impl RegisterFile {
    /// Create zeroed register files.
    pub const fn new() -> Self {
        Self {
            scalar: ScalarRegisterFile::new(),
            vector: VectorRegisterFile::new(),
        }
    }

    /// Clear both register files.
    pub fn reset(&mut self) {
        self.scalar.reset();
        self.vector.reset();
    }
}
