//! Tiled matrix memory banks.
//!
//! Four independently selectable N×N complex matrices, where
//! N = [`LANES`] × tile-factor. Elements are reached either one at a time by
//! `(row, col)` or eight at a time as a tile:
//!
//! | Axis | Fixed index | Stepping index |
//! |------|-------------|----------------|
//! | Row-major | row = `fixed` | col = `tile × 8 + lane` |
//! | Column-major | col = `fixed` | row = `tile × 8 + lane` |
//!
//! Coordinates are validated by the decoder before any access reaches a
//! bank; an out-of-range index here is a caller bug and panics.

use std::fmt::Write as _;

use crate::interpreter::fixed::Complex;

use super::registers::{Lanes, LANES, ZERO_LANES};

/// Number of matrix banks.
pub const NUM_BANKS: usize = 4;

/// Default number of 8-lane tiles per matrix axis.
pub const DEFAULT_TILE_FACTOR: usize = 2;

/// Matrix bank identifier (0-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BankId(u8);

impl BankId {
    /// Create a bank id, rejecting values above 3.
    pub const fn new(id: u8) -> Option<Self> {
        if (id as usize) < NUM_BANKS {
            Some(Self(id))
        } else {
            None
        }
    }

    /// Raw bank number.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Direction in which a tile's eight elements run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MajorAxis {
    /// Elements run along a row (row fixed, column steps).
    #[default]
    Row,
    /// Elements run down a column (column fixed, row steps).
    Column,
}

impl MajorAxis {
    /// Decode from the single layout bit (0 = row, 1 = column).
    #[inline]
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            MajorAxis::Column
        } else {
            MajorAxis::Row
        }
    }

    /// Encode as the single layout bit.
    #[inline]
    pub const fn bit(self) -> bool {
        matches!(self, MajorAxis::Column)
    }
}

/// One N×N complex matrix, stored row-major.
#[derive(Clone, Debug)]
struct Matrix {
    data: Vec<Complex>,
}

impl Matrix {
    fn new(dim: usize) -> Self {
        Self {
            data: vec![Complex::ZERO; dim * dim],
        }
    }
}

/// The four matrix banks of one processor.
#[derive(Clone, Debug)]
pub struct MatrixBanks {
    banks: [Matrix; NUM_BANKS],
    tile_factor: usize,
    dim: usize,
}

impl Default for MatrixBanks {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_FACTOR)
    }
}

impl MatrixBanks {
    /// Create zeroed banks with `tile_factor` tiles per axis.
    ///
    /// A tile factor of zero is raised to one.
    pub fn new(tile_factor: usize) -> Self {
        let tile_factor = tile_factor.max(1);
        let dim = tile_factor * LANES;
        Self {
            banks: std::array::from_fn(|_| Matrix::new(dim)),
            tile_factor,
            dim,
        }
    }

    /// Side length N of every matrix.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Tiles per axis.
    #[inline]
    pub fn tile_factor(&self) -> usize {
        self.tile_factor
    }

    /// Check a scalar coordinate against the matrix size.
    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.dim && col < self.dim
    }

    /// Check a tile coordinate against the matrix size.
    #[inline]
    pub fn contains_tile(&self, tile: usize, fixed: usize) -> bool {
        tile < self.tile_factor && fixed < self.dim
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            self.contains(row, col),
            "matrix coordinate ({}, {}) outside {}x{}",
            row,
            col,
            self.dim,
            self.dim
        );
        row * self.dim + col
    }

    #[inline]
    fn tile_offset(&self, tile: usize, fixed: usize, axis: MajorAxis, lane: usize) -> usize {
        let step = tile * LANES + lane;
        match axis {
            MajorAxis::Row => self.offset(fixed, step),
            MajorAxis::Column => self.offset(step, fixed),
        }
    }

    /// Read one element.
    pub fn read_scalar(&self, bank: BankId, row: usize, col: usize) -> Complex {
        let offset = self.offset(row, col);
        self.banks[bank.0 as usize].data[offset]
    }

    /// Write one element.
    pub fn write_scalar(&mut self, bank: BankId, row: usize, col: usize, value: Complex) {
        let offset = self.offset(row, col);
        self.banks[bank.0 as usize].data[offset] = value;
    }

    /// Read eight contiguous elements along `axis`.
    pub fn read_vector(&self, bank: BankId, tile: usize, fixed: usize, axis: MajorAxis) -> Lanes {
        let mut lanes = ZERO_LANES;
        for (lane, slot) in lanes.iter_mut().enumerate() {
            let offset = self.tile_offset(tile, fixed, axis, lane);
            *slot = self.banks[bank.0 as usize].data[offset];
        }
        lanes
    }

    /// Write eight contiguous elements along `axis`.
    pub fn write_vector(
        &mut self,
        bank: BankId,
        tile: usize,
        fixed: usize,
        axis: MajorAxis,
        values: &Lanes,
    ) {
        for (lane, value) in values.iter().enumerate() {
            let offset = self.tile_offset(tile, fixed, axis, lane);
            self.banks[bank.0 as usize].data[offset] = *value;
        }
    }

    /// Zero every bank.
    pub fn reset(&mut self) {
        for bank in &mut self.banks {
            bank.data.fill(Complex::ZERO);
        }
    }

    /// Render the top-left `rows × cols` window of a bank.
    pub fn format_window(&self, bank: BankId, rows: usize, cols: usize) -> String {
        let rows = rows.min(self.dim);
        let cols = cols.min(self.dim);
        let mut out = format!(
            "mb{}: {}x{} matrix, top-left {}x{} window:\n",
            bank.0, self.dim, self.dim, rows, cols
        );
        for row in 0..rows {
            let _ = write!(out, "  r{:02}:", row);
            for col in 0..cols {
                let (re, im) = self.read_scalar(bank, row, col).to_f64();
                let _ = write!(out, " {:.3}{:+.3}i", re, im);
            }
            out.push('\n');
        }
        if rows < self.dim || cols < self.dim {
            out.push_str("  ...\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(id: u8) -> BankId {
        BankId::new(id).unwrap()
    }

    fn ramp() -> Lanes {
        std::array::from_fn(|i| Complex::from_int(i as i32 + 1, 0))
    }

    #[test]
    fn test_bank_id_range() {
        assert!(BankId::new(3).is_some());
        assert!(BankId::new(4).is_none());
    }

    #[test]
    fn test_dimensions() {
        let m = MatrixBanks::default();
        assert_eq!(m.dimension(), 16);
        assert_eq!(m.tile_factor(), 2);

        let m = MatrixBanks::new(4);
        assert_eq!(m.dimension(), 32);
        assert_eq!(MatrixBanks::new(0).dimension(), 8);
    }

    #[test]
    fn test_scalar_read_write() {
        let mut m = MatrixBanks::default();
        m.write_scalar(bank(2), 15, 0, Complex::from_int(7, -7));

        assert_eq!(m.read_scalar(bank(2), 15, 0), Complex::from_int(7, -7));
        // Banks are independent
        assert_eq!(m.read_scalar(bank(1), 15, 0), Complex::ZERO);
    }

    #[test]
    fn test_row_major_round_trip() {
        let mut m = MatrixBanks::default();
        m.write_vector(bank(0), 0, 3, MajorAxis::Row, &ramp());

        assert_eq!(m.read_vector(bank(0), 0, 3, MajorAxis::Row), ramp());
        // Elements landed along row 3
        assert_eq!(m.read_scalar(bank(0), 3, 0), Complex::from_int(1, 0));
        assert_eq!(m.read_scalar(bank(0), 3, 7), Complex::from_int(8, 0));
        assert_eq!(m.read_scalar(bank(0), 4, 0), Complex::ZERO);
    }

    #[test]
    fn test_column_major_second_tile() {
        let mut m = MatrixBanks::default();
        m.write_vector(bank(1), 1, 5, MajorAxis::Column, &ramp());

        // Tile 1 covers rows 8..16 of column 5
        assert_eq!(m.read_scalar(bank(1), 8, 5), Complex::from_int(1, 0));
        assert_eq!(m.read_scalar(bank(1), 15, 5), Complex::from_int(8, 0));
        assert_eq!(m.read_vector(bank(1), 1, 5, MajorAxis::Column), ramp());
        assert_eq!(m.read_vector(bank(1), 0, 5, MajorAxis::Column), ZERO_LANES);
    }

    #[test]
    fn test_row_and_column_views_share_storage() {
        let mut m = MatrixBanks::default();
        m.write_vector(bank(3), 0, 2, MajorAxis::Row, &ramp());

        // Column 4, tile 0: element at row 2 is the row write's lane 4
        let col = m.read_vector(bank(3), 0, 4, MajorAxis::Column);
        assert_eq!(col[2], Complex::from_int(5, 0));
        assert_eq!(col[0], Complex::ZERO);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_range_panics() {
        let m = MatrixBanks::default();
        m.read_scalar(bank(0), 16, 0);
    }

    #[test]
    fn test_reset() {
        let mut m = MatrixBanks::default();
        m.write_scalar(bank(0), 1, 1, Complex::ONE);
        m.reset();
        assert_eq!(m.read_scalar(bank(0), 1, 1), Complex::ZERO);
    }

    #[test]
    fn test_format_window() {
        let mut m = MatrixBanks::default();
        m.write_scalar(bank(0), 0, 1, Complex::from_int(2, 1));

        let text = m.format_window(bank(0), 2, 2);
        assert!(text.contains("16x16"));
        assert!(text.contains("2.000+1.000i"));
        assert!(text.ends_with("...\n"));
    }
}
