//! Run configuration, loadable from JSON and overridable from the command line.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LifeError, Result};

fn default_workers() -> usize {
    1
}

fn default_threads() -> usize {
    1
}

fn default_capacity() -> usize {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub generations: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Rayon threads for the interior update of each worker.
    #[serde(default = "default_threads")]
    pub threads_per_worker: usize,
    /// Absent means a stalled neighbor blocks forever.
    #[serde(default)]
    pub exchange_timeout_ms: Option<u64>,
    /// Messages buffered per channel; 0 makes every send synchronous.
    #[serde(default = "default_capacity")]
    pub channel_capacity: usize,
}

impl RunConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, generations: u64) -> Self {
        RunConfig {
            input: input.into(),
            output: output.into(),
            generations,
            workers: default_workers(),
            threads_per_worker: default_threads(),
            exchange_timeout_ms: None,
            channel_capacity: default_capacity(),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| LifeError::io(path, e))?;
        serde_json::from_reader(file)
            .map_err(|e| LifeError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LifeError::Config(e.to_string()))
    }

    pub fn exchange_timeout(&self) -> Option<Duration> {
        self.exchange_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(LifeError::Config("workers must be >= 1".into()));
        }
        if self.threads_per_worker == 0 {
            return Err(LifeError::Config("threads_per_worker must be >= 1".into()));
        }
        // the last two ranks of an odd ring both send first, which only
        // completes when sends are buffered
        if self.channel_capacity == 0 && self.workers > 1 && self.workers % 2 == 1 {
            return Err(LifeError::Config(format!(
                "synchronous channels need an even number of workers, got {}",
                self.workers
            )));
        }
        Ok(())
    }
}
