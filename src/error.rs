//! Error taxonomy shared by every layer of the simulation.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// All failures the simulation core can surface.
///
/// None of these are retried internally. A ring exchange that fails half way
/// leaves halo rows undefined, so the caller must abort the whole run.
#[derive(Debug, thiserror::Error)]
pub enum LifeError {
    /// Grid dimensions rejected at construction.
    #[error("invalid grid shape {width}x{height}: {reason}")]
    InvalidShape {
        width: i64,
        height: i64,
        reason: &'static str,
    },

    /// Width/height inconsistent with the data being loaded or exchanged.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Cell or row index outside the grid.
    #[error("index ({row}, {col}) out of range for a grid of {height} rows x {width} columns")]
    OutOfRange {
        row: i64,
        col: i64,
        height: usize,
        width: usize,
    },

    /// Character in a text init vector that is neither the dead nor the alive symbol.
    #[error("illegal character {found:?} at index {index}, expected '*' (alive) or ' ' (dead)")]
    InvalidSymbol { index: usize, found: char },

    /// Grid file shorter than the partition arithmetic requires.
    #[error("truncated file {path}: needed {expected} bytes at offset {offset}, {available} available")]
    TruncatedFile {
        path: PathBuf,
        offset: u64,
        expected: u64,
        available: u64,
    },

    /// A ring neighbor did not complete a send/recv within the configured timeout.
    #[error("peer {peer} unresponsive after {timeout:?}")]
    PeerUnresponsive { peer: usize, timeout: Duration },

    /// The channel to a peer was torn down (the peer's worker exited).
    #[error("transport to peer {peer} closed")]
    TransportClosed { peer: usize },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Rejected run configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LifeError>;

impl LifeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LifeError::Io {
            path: path.into(),
            source,
        }
    }
}
