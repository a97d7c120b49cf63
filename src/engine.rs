//! One worker's simulation loop.

use std::mem;
use std::path::Path;

use rayon::ThreadPool;
use tracing::{debug, info};

use crate::automaton::{step_interior, BitGrid};
use crate::error::{LifeError, Result};
use crate::exchange::{ExchangeOrder, RingExchange};
use crate::partition::Partition;
use crate::store;
use crate::transport::Transport;

/// Owns a worker's band (with halo rows), its scratch buffer and its
/// transport endpoint.
pub struct SimulationEngine<T: Transport> {
    current: BitGrid,
    next: BitGrid,
    partition: Partition,
    exchange: RingExchange,
    transport: T,
    pool: ThreadPool,
    generation: u64,
}

fn build_pool(threads: usize, rank: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(move |i| format!("life-{}-{}", rank, i))
        .build()
        .map_err(|e| LifeError::Config(format!("cannot build thread pool: {}", e)))
}

impl<T: Transport> SimulationEngine<T> {
    /// Wrap an already loaded band. Row 0 and the last row are halos and must
    /// already mirror the neighbors' boundary rows.
    pub fn new(grid: BitGrid, transport: T, threads: usize) -> Result<Self> {
        let partition = Partition::new(transport.rank(), transport.world_size())?;
        if ExchangeOrder::needs_buffered_sends(partition.total_ranks()) && !transport.buffers_sends()
        {
            return Err(LifeError::Config(format!(
                "a ring of {} workers needs a transport that buffers sends",
                partition.total_ranks()
            )));
        }
        if grid.height() < 3 {
            return Err(LifeError::DimensionMismatch(format!(
                "a band needs at least one interior row plus two halos, got height {}",
                grid.height()
            )));
        }

        Ok(SimulationEngine {
            next: grid.clone(),
            current: grid,
            partition,
            exchange: RingExchange::new(partition),
            pool: build_pool(threads, partition.rank())?,
            transport,
            generation: 0,
        })
    }

    /// Load this worker's band (halos included) from a shared grid file.
    pub fn load(path: &Path, transport: T, threads: usize) -> Result<Self> {
        let partition = Partition::new(transport.rank(), transport.world_size())?;
        let grid = store::load_band(path, partition)?;
        Self::new(grid, transport, threads)
    }

    pub fn grid(&self) -> &BitGrid {
        &self.current
    }

    pub fn into_grid(self) -> BitGrid {
        self.current
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advance one generation: update interior rows into the scratch buffer,
    /// swap buffers, then refresh the halos from the neighbors.
    ///
    /// A failed exchange leaves the halos undefined; the run must be abandoned.
    pub fn step(&mut self) -> Result<()> {
        step_interior(&self.current, &mut self.next, &self.pool)?;
        // the halos now in `next` are stale, but they are overwritten before being read
        mem::swap(&mut self.current, &mut self.next);
        self.exchange.exchange(&mut self.current, &mut self.transport)?;
        self.generation += 1;
        debug!(
            rank = self.partition.rank(),
            generation = self.generation,
            "generation complete"
        );
        Ok(())
    }

    /// Run exactly `generations` steps in order, stopping at the first error.
    pub fn run(&mut self, generations: u64) -> Result<()> {
        info!(
            rank = self.partition.rank(),
            workers = self.partition.total_ranks(),
            rows = self.current.height() - 2,
            generations,
            "starting run"
        );
        for _ in 0..generations {
            self.step()?;
        }
        info!(
            rank = self.partition.rank(),
            generation = self.generation,
            population = self.interior_population(),
            "run finished"
        );
        Ok(())
    }

    /// Pull fresh halo rows without advancing a generation. Every worker in
    /// the ring has to call this together.
    pub fn refresh_halos(&mut self) -> Result<()> {
        self.exchange.exchange(&mut self.current, &mut self.transport)
    }

    /// Write this worker's interior rows to the shared output file.
    pub fn save(&self, path: &Path) -> Result<()> {
        store::save_band(path, &self.current, self.partition)
    }

    /// Live cells in the interior rows.
    pub fn interior_population(&self) -> usize {
        let bpr = self.current.bytes_per_row();
        let bytes = self.current.as_bytes();
        bytes[bpr..bytes.len() - bpr]
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum()
    }
}
