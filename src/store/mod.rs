//! Binary grid files.
//!
//! Layout, little-endian: `width: i32`, `height: i32`, then
//! `width * height / 8` bytes of packed rows. Halo rows are never stored.
//! Workers read only their band (plus borrowed border rows) and write only
//! their interior rows back, so any number of workers can share one file.

pub mod band;
pub mod header;
pub mod whole;

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{LifeError, Result};

pub use band::{load_band, prepare_output, save_band, write_header};
pub use header::{read_header, Header, HEADER_SIZE};
pub use whole::{load_grid, load_slice, save_grid};

/// Fill `buf` from `offset`, reporting a short file as `TruncatedFile`.
pub(crate) fn read_exact_at(file: &mut File, path: &Path, offset: u64, buf: &mut [u8]) -> Result<()> {
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| LifeError::io(path, e))?;
    match file.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            let file_len = file
                .metadata()
                .map_err(|e| LifeError::io(path, e))?
                .len();
            Err(LifeError::TruncatedFile {
                path: path.to_path_buf(),
                offset,
                expected: buf.len() as u64,
                available: file_len.saturating_sub(offset),
            })
        }
        Err(e) => Err(LifeError::io(path, e)),
    }
}

/// Positioned write that leaves every other byte of the file alone.
pub(crate) fn write_all_at(file: &mut File, path: &Path, offset: u64, buf: &[u8]) -> Result<()> {
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| LifeError::io(path, e))?;
    file.write_all(buf).map_err(|e| LifeError::io(path, e))
}

pub(crate) fn open_read(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| LifeError::io(path, e))
}
