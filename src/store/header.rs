//! The 8-byte file header.

use std::fs::File;
use std::path::Path;

use super::{open_read, read_exact_at};
use crate::error::{LifeError, Result};

pub const HEADER_SIZE: u64 = 8;

/// `(width, height)` of the stored grid; height counts interior rows only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub width: i32,
    pub height: i32,
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut bytes = [0u8; HEADER_SIZE as usize];
        bytes[..4].copy_from_slice(&self.width.to_le_bytes());
        bytes[4..].copy_from_slice(&self.height.to_le_bytes());
        bytes
    }

    pub fn decode(bytes: [u8; HEADER_SIZE as usize]) -> Self {
        Header {
            width: i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            height: i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub(crate) fn read_from(file: &mut File, path: &Path) -> Result<Self> {
        let mut bytes = [0u8; HEADER_SIZE as usize];
        read_exact_at(file, path, 0, &mut bytes)?;
        let header = Header::decode(bytes);
        header.validate()?;
        Ok(header)
    }

    /// Reject headers whose rows are not whole bytes.
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.width % 8 != 0 {
            return Err(LifeError::DimensionMismatch(format!(
                "stored width {} is not a positive multiple of 8",
                self.width
            )));
        }
        if self.height <= 0 {
            return Err(LifeError::DimensionMismatch(format!(
                "stored height {} is not positive",
                self.height
            )));
        }
        Ok(())
    }

    pub fn bytes_per_row(&self) -> usize {
        self.width as usize / 8
    }

    /// Byte offset of global row `row`.
    pub fn row_offset(&self, row: usize) -> u64 {
        HEADER_SIZE + (row * self.bytes_per_row()) as u64
    }

    /// Total file length implied by the header.
    pub fn file_len(&self) -> u64 {
        self.row_offset(self.height as usize)
    }
}

/// Read and validate the header of a grid file.
pub fn read_header(path: &Path) -> Result<Header> {
    let mut file = open_read(path)?;
    Header::read_from(&mut file, path)
}
