//! Game of Life update rule (B3/S23) over bit-packed grids.

use rayon::prelude::*;
use rayon::ThreadPool;

use super::grid::{bit_mask, BitGrid};
use super::toroidal::ToroidalView;
use crate::error::{LifeError, Result};

/// B3/S23: birth on 3, survival on 2 or 3.
#[inline]
pub fn next_state(alive: bool, neighbors: u8) -> bool {
    match neighbors {
        3 => true,
        2 => alive,
        _ => false,
    }
}

/// Count live cells in the Moore neighborhood (8 neighbors), wrapping both axes.
pub fn count_neighbors(view: ToroidalView<'_>, row: usize, col: usize) -> u8 {
    let (row, col) = (row as i64, col as i64);
    let mut count = 0;

    for dr in -1..=1 {
        for dc in -1..=1 {
            if dr == 0 && dc == 0 {
                continue;
            }
            if view.is_alive(row + dr, col + dc) {
                count += 1;
            }
        }
    }

    count
}

/// Compute one packed output row from `current`.
fn update_row(current: &BitGrid, row: usize, out: &mut [u8]) {
    let view = current.toroidal();
    out.fill(0);
    for col in 0..current.width() {
        if next_state(current.cell(row, col), count_neighbors(view, row, col)) {
            out[col / 8] |= bit_mask(col);
        }
    }
}

/// Advance every interior row (`1..height-1`) of `current` into `next`.
///
/// Row 0 and the last row are halo rows: they are read as neighbors but never
/// written, so `next` keeps whatever halo content it had. Columns wrap.
/// Rows are independent, so the work is split across `pool`.
pub fn step_interior(current: &BitGrid, next: &mut BitGrid, pool: &ThreadPool) -> Result<()> {
    if current.width() != next.width() || current.height() != next.height() {
        return Err(LifeError::DimensionMismatch(format!(
            "step buffers differ: {}x{} vs {}x{}",
            current.width(),
            current.height(),
            next.width(),
            next.height()
        )));
    }

    let height = current.height();
    if height < 3 {
        return Ok(());
    }
    let bpr = current.bytes_per_row();

    pool.install(|| {
        next.as_bytes_mut()
            .par_chunks_mut(bpr)
            .enumerate()
            .skip(1)
            .take(height - 2)
            .for_each(|(row, out)| update_row(current, row, out));
    });

    Ok(())
}

/// One generation of a single-process toroidal Game of Life: every row is
/// updated and both axes wrap.
pub fn step_toroidal(grid: &BitGrid) -> BitGrid {
    let mut next = grid.clone();
    let bpr = grid.bytes_per_row();
    for (row, out) in next.as_bytes_mut().chunks_mut(bpr).enumerate() {
        update_row(grid, row, out);
    }
    next
}
