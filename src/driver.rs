//! Load, run, save: one thread per worker over an in-process ring.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::RunConfig;
use crate::engine::SimulationEngine;
use crate::error::{LifeError, Result};
use crate::store;
use crate::transport::ChannelTransport;

/// Outcome of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub width: usize,
    pub height: usize,
    pub workers: usize,
    pub generations: u64,
    /// Slowest worker's time spent in `run`, excluding file I/O.
    pub elapsed: Duration,
}

fn run_worker(config: &RunConfig, transport: ChannelTransport) -> Result<Duration> {
    let mut engine =
        SimulationEngine::load(&config.input, transport, config.threads_per_worker)?;
    let started = Instant::now();
    engine.run(config.generations)?;
    let elapsed = started.elapsed();
    engine.save(&config.output)?;
    Ok(elapsed)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Simulate `config.generations` generations of the grid in `config.input`
/// and write the result to `config.output`.
///
/// Bands are written back at fixed offsets, so the grid height must divide
/// evenly by the worker count. Any worker failure fails the whole run and the
/// output file must be considered invalid.
pub fn run_ring(config: &RunConfig) -> Result<RunReport> {
    config.validate()?;
    // the output is truncated before the workers read their bands
    if same_file(&config.input, &config.output) {
        return Err(LifeError::Config(format!(
            "output {} would overwrite the input",
            config.output.display()
        )));
    }

    let header = store::read_header(&config.input)?;
    let (width, height) = (header.width as usize, header.height as usize);
    if height % config.workers != 0 || height < config.workers {
        return Err(LifeError::DimensionMismatch(format!(
            "{} rows do not split evenly across {} workers",
            height, config.workers
        )));
    }
    store::prepare_output(&config.output, width, height)?;

    info!(
        width,
        height,
        workers = config.workers,
        generations = config.generations,
        "simulating {}",
        config.input.display()
    );

    let transports =
        ChannelTransport::ring(config.workers, config.channel_capacity, config.exchange_timeout());

    let results: Vec<Result<Duration>> = thread::scope(|scope| {
        let handles: Vec<_> = transports
            .into_iter()
            .map(|transport| scope.spawn(move || run_worker(config, transport)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(LifeError::Config("worker thread panicked".into())))
            })
            .collect()
    });

    let mut elapsed = Duration::ZERO;
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(worker_elapsed) => elapsed = elapsed.max(worker_elapsed),
            Err(err) => failures.push(err),
        }
    }
    // a closed channel is usually fallout from another worker's failure
    if let Some(index) = failures
        .iter()
        .position(|err| !matches!(err, LifeError::TransportClosed { .. }))
    {
        return Err(failures.swap_remove(index));
    }
    if let Some(err) = failures.pop() {
        return Err(err);
    }

    info!(
        "total time: {} ms, output written to {}",
        elapsed.as_millis(),
        config.output.display()
    );

    Ok(RunReport {
        width,
        height,
        workers: config.workers,
        generations: config.generations,
        elapsed,
    })
}
