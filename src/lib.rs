//! Ring Life - distributed Game of Life on a toroidal bit grid.
//!
//! The grid is split into horizontal row bands, one per worker. Workers
//! advance in lock-step and swap border rows with their two ring neighbors
//! every generation. Bands are read from and written back to one shared
//! binary file, independent of the worker count.

pub mod automaton;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod partition;
pub mod store;
pub mod transport;

#[cfg(test)]
mod tests;

pub use automaton::{BitGrid, ToroidalView, ALIVE_CELL, DEAD_CELL};
pub use config::RunConfig;
pub use driver::{run_ring, RunReport};
pub use engine::SimulationEngine;
pub use error::{LifeError, Result};
pub use exchange::{ExchangeOrder, RingExchange};
pub use partition::{Partition, RowRange, OVERLAP_ROWS};
pub use transport::{ChannelTransport, RankProvider, Tag, Transport};
