//! Row-band decomposition and ring topology.

use crate::error::{LifeError, Result};

/// Halo rows above and below each band.
pub const OVERLAP_ROWS: usize = 1;

/// Where one worker sits in the ring and which rows it owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    rank: usize,
    total_ranks: usize,
}

/// Global rows `[start, start + len)` owned by one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub len: usize,
}

impl Partition {
    pub fn new(rank: usize, total_ranks: usize) -> Result<Self> {
        if total_ranks == 0 || rank >= total_ranks {
            return Err(LifeError::Config(format!(
                "rank {} is not in a ring of {} workers",
                rank, total_ranks
            )));
        }
        Ok(Partition { rank, total_ranks })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn total_ranks(&self) -> usize {
        self.total_ranks
    }

    pub fn is_last(&self) -> bool {
        self.rank == self.total_ranks - 1
    }

    pub fn predecessor(&self) -> usize {
        (self.rank + self.total_ranks - 1) % self.total_ranks
    }

    pub fn successor(&self) -> usize {
        (self.rank + 1) % self.total_ranks
    }

    /// Rows owned by this worker out of `global_height`.
    ///
    /// Every worker gets `global_height / N` rows; the last one also takes the
    /// remainder. Fails if some worker would get no rows at all.
    pub fn rows(&self, global_height: usize) -> Result<RowRange> {
        let base = global_height / self.total_ranks;
        if base == 0 {
            return Err(LifeError::DimensionMismatch(format!(
                "{} rows cannot be split across {} workers",
                global_height, self.total_ranks
            )));
        }
        let len = if self.is_last() {
            global_height - base * (self.total_ranks - 1)
        } else {
            base
        };
        Ok(RowRange {
            start: self.rank * base,
            len,
        })
    }

    /// Height of the local grid: the band plus one halo row on each side.
    pub fn local_height(&self, global_height: usize) -> Result<usize> {
        Ok(self.rows(global_height)?.len + 2 * OVERLAP_ROWS)
    }
}
