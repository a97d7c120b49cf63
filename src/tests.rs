//! Cross-module scenarios: file partitioning, multi-worker rings, drivers.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::automaton::{step_toroidal, BitGrid};
use crate::config::RunConfig;
use crate::driver::run_ring;
use crate::engine::SimulationEngine;
use crate::error::LifeError;
use crate::exchange::RingExchange;
use crate::partition::Partition;
use crate::store::{load_band, load_grid, save_band, save_grid};
use crate::transport::{ChannelTransport, RankProvider};

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A file path in a shared temp directory, removed when dropped.
pub(crate) struct ScratchFile(PathBuf);

impl Deref for ScratchFile {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for ScratchFile {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<&ScratchFile> for PathBuf {
    fn from(file: &ScratchFile) -> PathBuf {
        file.0.clone()
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// A fresh path that no other test (or concurrent test process) uses.
pub(crate) fn scratch_path(name: &str) -> ScratchFile {
    let dir = std::env::temp_dir().join("ring-life-tests");
    std::fs::create_dir_all(&dir).unwrap();
    let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = dir.join(format!("{}-{}-{}", std::process::id(), n, name));
    let _ = std::fs::remove_file(&path);
    ScratchFile(path)
}

/// Pseudo-random grid from a simple LCG, roughly one live cell in three.
fn noisy_grid(width: i64, height: i64, seed: u32) -> BitGrid {
    let mut grid = BitGrid::new(width, height).unwrap();
    let mut lcg = seed.wrapping_mul(1103515245).wrapping_add(12345);
    for row in 0..height {
        for col in 0..width {
            lcg = lcg.wrapping_mul(1103515245).wrapping_add(12345);
            grid.set(row, col, (lcg >> 16) % 3 == 0).unwrap();
        }
    }
    grid
}

fn toroidal_reference(grid: &BitGrid, generations: u64) -> BitGrid {
    let mut reference = grid.clone();
    for _ in 0..generations {
        reference = step_toroidal(&reference);
    }
    reference
}

/// Run every worker of a ring on its own thread and return the final bands by rank.
fn run_engines(path: &Path, workers: usize, generations: u64, capacity: usize) -> Vec<BitGrid> {
    let transports = ChannelTransport::ring(workers, capacity, Some(Duration::from_secs(10)));
    let handles: Vec<_> = transports
        .into_iter()
        .map(|transport| {
            let path = path.to_path_buf();
            thread::spawn(move || {
                let mut engine = SimulationEngine::load(&path, transport, 2).unwrap();
                engine.run(generations).unwrap();
                engine.into_grid()
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

fn interior_rows(band: &BitGrid) -> &[u8] {
    let bpr = band.bytes_per_row();
    let bytes = band.as_bytes();
    &bytes[bpr..bytes.len() - bpr]
}

#[test]
fn test_partition_round_trip_is_byte_exact() {
    let grid = noisy_grid(24, 12, 7);
    let source = scratch_path("round_trip_source.dat");
    save_grid(&source, &grid).unwrap();
    let original = std::fs::read(&source).unwrap();

    for workers in 1..=4 {
        let target = scratch_path("round_trip_target.dat");
        let bands: Vec<BitGrid> = (0..workers)
            .map(|rank| load_band(&source, Partition::new(rank, workers).unwrap()).unwrap())
            .collect();

        // write back highest rank first; rank 0's header write must not clobber anything
        for (rank, band) in bands.iter().enumerate().rev() {
            save_band(&target, band, Partition::new(rank, workers).unwrap()).unwrap();
        }
        assert_eq!(std::fs::read(&target).unwrap(), original, "{} workers", workers);
    }
}

#[test]
fn test_zero_generation_engines_round_trip() {
    let grid = noisy_grid(16, 8, 3);
    let source = scratch_path("engines_zero_source.dat");
    let target = scratch_path("engines_zero_target.dat");
    save_grid(&source, &grid).unwrap();

    let bands = run_engines(&source, 4, 0, 1);
    for (rank, band) in bands.iter().enumerate() {
        save_band(&target, band, Partition::new(rank, 4).unwrap()).unwrap();
    }
    assert_eq!(load_grid(&target).unwrap(), grid);
}

#[test]
fn test_four_worker_halos_mirror_neighbors() {
    let grid = noisy_grid(16, 12, 11);
    let source = scratch_path("halo_symmetry.dat");
    save_grid(&source, &grid).unwrap();

    let bands = run_engines(&source, 4, 1, 1);
    for rank in 0..4 {
        let band = &bands[rank];
        let last = band.height() - 1;
        let pred = &bands[(rank + 3) % 4];
        let succ = &bands[(rank + 1) % 4];
        assert_eq!(band.row(0).unwrap(), pred.row(pred.height() - 2).unwrap());
        assert_eq!(band.row(last).unwrap(), succ.row(1).unwrap());
    }
}

#[test]
fn test_ring_matches_single_process_with_uneven_bands() {
    // 10 rows over 3 workers: bands of 3, 3 and 4
    let grid = noisy_grid(16, 10, 5);
    let source = scratch_path("uneven.dat");
    save_grid(&source, &grid).unwrap();

    let bands = run_engines(&source, 3, 6, 1);
    let heights: Vec<usize> = bands.iter().map(|b| b.height() - 2).collect();
    assert_eq!(heights, vec![3, 3, 4]);

    let combined: Vec<u8> = bands.iter().flat_map(|b| interior_rows(b).to_vec()).collect();
    let combined = BitGrid::from_bytes(16, 10, combined).unwrap();
    assert_eq!(combined, toroidal_reference(&grid, 6));
}

#[test]
fn test_odd_rings_match_single_process() {
    let grid = noisy_grid(16, 15, 17);
    let source = scratch_path("odd_rings.dat");
    save_grid(&source, &grid).unwrap();
    let reference = toroidal_reference(&grid, 7);

    for workers in [3, 5] {
        let bands = run_engines(&source, workers, 7, 1);
        let combined: Vec<u8> = bands.iter().flat_map(|b| interior_rows(b).to_vec()).collect();
        assert_eq!(
            BitGrid::from_bytes(16, 15, combined).unwrap(),
            reference,
            "{} workers",
            workers
        );
    }
}

#[test]
fn test_rendezvous_ring_with_even_workers() {
    let grid = noisy_grid(8, 8, 21);
    let source = scratch_path("rendezvous.dat");
    save_grid(&source, &grid).unwrap();

    let bands = run_engines(&source, 4, 5, 0);
    let combined: Vec<u8> = bands.iter().flat_map(|b| interior_rows(b).to_vec()).collect();
    assert_eq!(
        BitGrid::from_bytes(8, 8, combined).unwrap(),
        toroidal_reference(&grid, 5)
    );
}

#[test]
fn test_odd_rendezvous_ring_times_out_instead_of_hanging() {
    // ranks 1 and 2 both send first and nothing is buffered
    let transports = ChannelTransport::ring(3, 0, Some(Duration::from_millis(100)));
    let handles: Vec<_> = transports
        .into_iter()
        .map(|mut transport| {
            thread::spawn(move || {
                let partition = Partition::new(transport.rank(), 3).unwrap();
                let mut band = BitGrid::new(8, 3).unwrap();
                RingExchange::new(partition).exchange(&mut band, &mut transport)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.iter().all(|r| r.is_err()));
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(LifeError::PeerUnresponsive { .. }))));
}

#[test]
fn test_run_ring_end_to_end() {
    let grid = noisy_grid(32, 16, 99);
    let input = scratch_path("driver_in.dat");
    save_grid(&input, &grid).unwrap();

    for workers in [1, 2, 4] {
        let output = scratch_path("driver_out.dat");
        let mut config = RunConfig::new(&input, &output, 9);
        config.workers = workers;
        config.threads_per_worker = 2;

        let report = run_ring(&config).unwrap();
        assert_eq!((report.width, report.height), (32, 16));
        assert_eq!(report.workers, workers);
        assert_eq!(load_grid(&output).unwrap(), toroidal_reference(&grid, 9));
    }
}

#[test]
fn test_run_ring_odd_worker_counts() {
    let grid = noisy_grid(16, 15, 42);
    let input = scratch_path("driver_odd_in.dat");
    save_grid(&input, &grid).unwrap();

    for workers in [3, 5] {
        let output = scratch_path("driver_odd_out.dat");
        let mut config = RunConfig::new(&input, &output, 4);
        config.workers = workers;
        config.exchange_timeout_ms = Some(10_000);

        run_ring(&config).unwrap();
        assert_eq!(load_grid(&output).unwrap(), toroidal_reference(&grid, 4));
    }
}

#[test]
fn test_run_ring_refuses_to_overwrite_input() {
    let grid = noisy_grid(16, 8, 8);
    let path = scratch_path("driver_in_place.dat");
    save_grid(&path, &grid).unwrap();

    let mut config = RunConfig::new(&path, &path, 0);
    config.workers = 2;
    assert!(matches!(run_ring(&config), Err(LifeError::Config(_))));
    assert_eq!(load_grid(&path).unwrap(), grid);
}

#[test]
fn test_run_ring_rejects_uneven_split() {
    let input = scratch_path("driver_uneven.dat");
    save_grid(&input, &noisy_grid(8, 10, 1)).unwrap();
    let output = scratch_path("driver_uneven_out.dat");
    let mut config = RunConfig::new(&input, &output, 1);
    config.workers = 3;
    assert!(matches!(
        run_ring(&config),
        Err(LifeError::DimensionMismatch(_))
    ));
}

#[test]
fn test_run_ring_missing_input() {
    let input = scratch_path("driver_missing.dat");
    let output = scratch_path("driver_missing_out.dat");
    let config = RunConfig::new(&input, &output, 1);
    assert!(matches!(run_ring(&config), Err(LifeError::Io { .. })));
}
