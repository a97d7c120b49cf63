//! Per-worker band I/O against a shared grid file.

use std::fs::{File, OpenOptions};
use std::path::Path;

use tracing::debug;

use super::header::{Header, HEADER_SIZE};
use super::{open_read, read_exact_at, write_all_at};
use crate::automaton::BitGrid;
use crate::error::{LifeError, Result};
use crate::partition::{Partition, OVERLAP_ROWS};

/// Load one worker's band plus a halo row on each side.
///
/// The halo rows are borrowed from the neighboring bands. For the first
/// worker the top halo is the last row of the file, and for the last worker
/// the bottom halo is the first row, so the vertical axis wraps.
pub fn load_band(path: &Path, partition: Partition) -> Result<BitGrid> {
    let mut file = open_read(path)?;
    let header = Header::read_from(&mut file, path)?;
    let global_height = header.height as usize;
    let band = partition.rows(global_height)?;
    let local_height = band.len + 2 * OVERLAP_ROWS;

    let mut grid = BitGrid::new(i64::from(header.width), local_height as i64)?;

    let mut start = band.start as i64 - OVERLAP_ROWS as i64;
    let mut filled_top = 0;
    if start < 0 {
        // wrap: the rows above global row 0 are the tail of the file
        filled_top = start.unsigned_abs() as usize;
        read_exact_at(
            &mut file,
            path,
            header.row_offset(global_height - filled_top),
            grid.rows_mut(0, filled_top),
        )?;
        start = 0;
    }
    let start = start as usize;

    let mut length = local_height - filled_top;
    if start + length > global_height {
        // wrap: the rows below the last global row are the head of the file
        let overflow = start + length - global_height;
        read_exact_at(
            &mut file,
            path,
            header.row_offset(0),
            grid.rows_mut(local_height - overflow, overflow),
        )?;
        length -= overflow;
    }

    read_exact_at(
        &mut file,
        path,
        header.row_offset(start),
        grid.rows_mut(filled_top, length),
    )?;

    debug!(
        rank = partition.rank(),
        first_row = band.start,
        rows = band.len,
        "loaded band from {}",
        path.display()
    );
    Ok(grid)
}

fn open_write(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| LifeError::io(path, e))
}

/// Write the header in place without truncating the file.
pub fn write_header(path: &Path, width: usize, height: usize) -> Result<()> {
    let header = header_for(width, height)?;
    let mut file = open_write(path)?;
    write_all_at(&mut file, path, 0, &header.encode())
}

/// Create (or truncate) `path` and size it for a `width x height` grid, so
/// that concurrent band writes land in an existing file of full length.
pub fn prepare_output(path: &Path, width: usize, height: usize) -> Result<()> {
    let header = header_for(width, height)?;
    let mut file = File::create(path).map_err(|e| LifeError::io(path, e))?;
    write_all_at(&mut file, path, 0, &header.encode())?;
    file.set_len(header.file_len())
        .map_err(|e| LifeError::io(path, e))
}

/// Write a worker's interior rows into the shared file.
///
/// Rank 0 also rewrites the header with `interior_rows * total_ranks` as the
/// height. Each rank writes at `rank * interior_rows` rows past the header,
/// which only lines up when every band has the same interior height.
/// Ranks write disjoint byte ranges, so no locking is needed.
pub fn save_band(path: &Path, grid: &BitGrid, partition: Partition) -> Result<()> {
    let interior = grid
        .height()
        .checked_sub(2 * OVERLAP_ROWS)
        .filter(|&rows| rows > 0)
        .ok_or_else(|| {
            LifeError::DimensionMismatch(format!(
                "a band of height {} has no interior rows",
                grid.height()
            ))
        })?;

    let mut file = open_write(path)?;
    if partition.rank() == 0 {
        let header = header_for(grid.width(), interior * partition.total_ranks())?;
        write_all_at(&mut file, path, 0, &header.encode())?;
    }

    let offset = HEADER_SIZE + (partition.rank() * interior * grid.bytes_per_row()) as u64;
    write_all_at(
        &mut file,
        path,
        offset,
        grid.rows(OVERLAP_ROWS, interior),
    )?;

    debug!(
        rank = partition.rank(),
        offset,
        rows = interior,
        "saved band to {}",
        path.display()
    );
    Ok(())
}

pub(crate) fn header_for(width: usize, height: usize) -> Result<Header> {
    let header = Header {
        width: i32::try_from(width)
            .map_err(|_| LifeError::DimensionMismatch(format!("width {} exceeds i32", width)))?,
        height: i32::try_from(height)
            .map_err(|_| LifeError::DimensionMismatch(format!("height {} exceeds i32", height)))?,
    };
    header.validate()?;
    Ok(header)
}
