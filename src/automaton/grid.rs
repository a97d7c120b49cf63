//! Bit-packed rectangular grid with row-level bulk access.
//!
//! One bit per cell, row-major. Cell `(row, col)` lives at bit
//! `width * row + col`; inside a byte the most significant bit is the
//! leftmost cell. Rows are whole bytes because the width is a multiple of 8.

use std::fmt;

use crate::error::{LifeError, Result};

/// Symbol for a live cell in text init vectors.
pub const ALIVE_CELL: char = '*';
/// Symbol for a dead cell in text init vectors.
pub const DEAD_CELL: char = ' ';

/// Fixed-shape bit grid. Cloning deep-copies the storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitGrid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

#[inline]
pub(crate) fn bit_mask(bit: usize) -> u8 {
    0x80 >> (bit % 8)
}

impl BitGrid {
    /// Create an all-dead grid.
    ///
    /// Fails with `InvalidShape` if either dimension is non-positive, the
    /// width is not a multiple of 8, or the cell count does not fit a
    /// signed 32-bit count.
    pub fn new(width: i64, height: i64) -> Result<Self> {
        let invalid = |reason| LifeError::InvalidShape {
            width,
            height,
            reason,
        };

        if width <= 0 || height <= 0 {
            return Err(invalid("width and height must be > 0"));
        }
        if width % 8 != 0 {
            return Err(invalid("width must be a multiple of 8"));
        }
        let size = width
            .checked_mul(height)
            .ok_or_else(|| invalid("cell count overflows"))?;
        if size > i64::from(i32::MAX) {
            return Err(invalid("cell count exceeds the 32-bit limit"));
        }
        if size % 8 != 0 {
            return Err(invalid("cell count must be a multiple of 8"));
        }

        Ok(BitGrid {
            width: width as usize,
            height: height as usize,
            cells: vec![0; (size / 8) as usize],
        })
    }

    /// Wrap existing packed storage. `bytes` must hold exactly `width * height / 8` bytes.
    pub fn from_bytes(width: i64, height: i64, bytes: Vec<u8>) -> Result<Self> {
        let mut grid = BitGrid::new(width, height)?;
        if bytes.len() != grid.cells.len() {
            return Err(LifeError::DimensionMismatch(format!(
                "{}x{} grid needs {} bytes, got {}",
                width,
                height,
                grid.cells.len(),
                bytes.len()
            )));
        }
        grid.cells = bytes;
        Ok(grid)
    }

    /// Build a grid from a row-major text init vector.
    pub fn from_init_vector(width: i64, height: i64, text: &str) -> Result<Self> {
        let mut grid = BitGrid::new(width, height)?;
        grid.load_init_vector(text)?;
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn bytes_per_row(&self) -> usize {
        self.width / 8
    }

    /// Packed storage, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Bytes of `count` consecutive rows starting at `start`.
    pub(crate) fn rows(&self, start: usize, count: usize) -> &[u8] {
        let bpr = self.bytes_per_row();
        &self.cells[start * bpr..(start + count) * bpr]
    }

    /// Mutable bytes of `count` consecutive rows starting at `start`.
    pub(crate) fn rows_mut(&mut self, start: usize, count: usize) -> &mut [u8] {
        let bpr = self.bytes_per_row();
        &mut self.cells[start * bpr..(start + count) * bpr]
    }

    /// Number of live cells.
    pub fn population(&self) -> usize {
        self.cells.iter().map(|b| b.count_ones() as usize).sum()
    }

    fn check_range(&self, row: i64, col: i64) -> Result<usize> {
        if row < 0 || row as u64 >= self.height as u64 || col < 0 || col as u64 >= self.width as u64
        {
            return Err(LifeError::OutOfRange {
                row,
                col,
                height: self.height,
                width: self.width,
            });
        }
        Ok(self.width * row as usize + col as usize)
    }

    pub fn is_alive(&self, row: i64, col: i64) -> Result<bool> {
        let bit = self.check_range(row, col)?;
        Ok(self.cells[bit / 8] & bit_mask(bit) != 0)
    }

    pub fn set(&mut self, row: i64, col: i64, alive: bool) -> Result<()> {
        let bit = self.check_range(row, col)?;
        self.write_bit(bit, alive);
        Ok(())
    }

    /// Unchecked read for in-range coordinates.
    #[inline]
    pub(crate) fn cell(&self, row: usize, col: usize) -> bool {
        let bit = self.width * row + col;
        self.cells[bit / 8] & bit_mask(bit) != 0
    }

    #[inline]
    pub(crate) fn put(&mut self, row: usize, col: usize, alive: bool) {
        let bit = self.width * row + col;
        self.write_bit(bit, alive);
    }

    #[inline]
    fn write_bit(&mut self, bit: usize, alive: bool) {
        if alive {
            self.cells[bit / 8] |= bit_mask(bit);
        } else {
            self.cells[bit / 8] &= !bit_mask(bit);
        }
    }

    fn check_row(&self, index: usize) -> Result<()> {
        if index >= self.height {
            return Err(LifeError::OutOfRange {
                row: index as i64,
                col: 0,
                height: self.height,
                width: self.width,
            });
        }
        Ok(())
    }

    /// The packed bytes of one row (`width / 8` bytes).
    pub fn row(&self, index: usize) -> Result<&[u8]> {
        self.check_row(index)?;
        let bpr = self.bytes_per_row();
        Ok(&self.cells[index * bpr..(index + 1) * bpr])
    }

    /// Overwrite one row with exactly `width / 8` packed bytes.
    pub fn set_row(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        self.check_row(index)?;
        let bpr = self.bytes_per_row();
        if bytes.len() != bpr {
            return Err(LifeError::DimensionMismatch(format!(
                "row of a {}-wide grid is {} bytes, got {}",
                self.width,
                bpr,
                bytes.len()
            )));
        }
        self.cells[index * bpr..(index + 1) * bpr].copy_from_slice(bytes);
        Ok(())
    }

    /// Replace all cells from a row-major text vector of `' '` and `'*'`.
    ///
    /// The grid is left untouched when the vector is rejected.
    pub fn load_init_vector(&mut self, text: &str) -> Result<()> {
        let length = text.chars().count();
        if length != self.size() {
            return Err(LifeError::DimensionMismatch(format!(
                "init vector has {} cells, grid has {}",
                length,
                self.size()
            )));
        }

        let mut cells = vec![0u8; self.cells.len()];
        for (index, ch) in text.chars().enumerate() {
            match ch {
                ALIVE_CELL => cells[index / 8] |= bit_mask(index),
                DEAD_CELL => {}
                found => return Err(LifeError::InvalidSymbol { index, found }),
            }
        }
        self.cells = cells;
        Ok(())
    }

    pub fn to_init_vector(&self) -> String {
        (0..self.size())
            .map(|bit| {
                if self.cells[bit / 8] & bit_mask(bit) != 0 {
                    ALIVE_CELL
                } else {
                    DEAD_CELL
                }
            })
            .collect()
    }
}

impl fmt::Display for BitGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            for col in 0..self.width {
                let ch = if self.cell(row, col) { ALIVE_CELL } else { DEAD_CELL };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
