//! Whole-file persistence and halo-less band reads.

use std::fs::File;
use std::path::Path;

use tracing::info;

use super::band::header_for;
use super::header::{Header, HEADER_SIZE};
use super::{open_read, read_exact_at, write_all_at};
use crate::automaton::BitGrid;
use crate::error::{LifeError, Result};
use crate::partition::Partition;

/// Write a complete grid (header plus every row), replacing `path`.
pub fn save_grid(path: &Path, grid: &BitGrid) -> Result<()> {
    let header = header_for(grid.width(), grid.height())?;
    let mut file = File::create(path).map_err(|e| LifeError::io(path, e))?;
    write_all_at(&mut file, path, 0, &header.encode())?;
    write_all_at(&mut file, path, HEADER_SIZE, grid.as_bytes())?;
    info!(
        width = grid.width(),
        height = grid.height(),
        "saved grid to {}",
        path.display()
    );
    Ok(())
}

/// Read a complete grid written by [`save_grid`] or by a full set of band saves.
pub fn load_grid(path: &Path) -> Result<BitGrid> {
    let mut file = open_read(path)?;
    let header = Header::read_from(&mut file, path)?;
    let mut grid = BitGrid::new(i64::from(header.width), i64::from(header.height))?;
    read_exact_at(&mut file, path, HEADER_SIZE, grid.as_bytes_mut())?;
    Ok(grid)
}

/// Read exactly the rows owned by `partition`, without halo rows.
pub fn load_slice(path: &Path, partition: Partition) -> Result<BitGrid> {
    let mut file = open_read(path)?;
    let header = Header::read_from(&mut file, path)?;
    let band = partition.rows(header.height as usize)?;
    let mut grid = BitGrid::new(i64::from(header.width), band.len as i64)?;
    read_exact_at(
        &mut file,
        path,
        header.row_offset(band.start),
        grid.as_bytes_mut(),
    )?;
    Ok(grid)
}
