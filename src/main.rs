use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ring_life::{run_ring, store, BitGrid, RunConfig};

#[derive(Parser)]
#[command(name = "ring-life", about = "Distributed Game of Life over a ring of workers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a grid file and write the final generation
    Run {
        /// JSON run configuration; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, short = 'g')]
        generations: Option<u64>,
        #[arg(long, short = 'n')]
        workers: Option<usize>,
        #[arg(long)]
        threads: Option<usize>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        capacity: Option<usize>,
    },
    /// Convert a text init vector (' ' dead, '*' alive, row-major) into a grid file
    Pack {
        #[arg(long)]
        width: i64,
        #[arg(long)]
        height: i64,
        #[arg(long)]
        text: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Print a grid file as text
    Unpack {
        #[arg(long)]
        input: PathBuf,
    },
}

#[allow(clippy::too_many_arguments)]
fn resolve_config(
    config: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    generations: Option<u64>,
    workers: Option<usize>,
    threads: Option<usize>,
    timeout_ms: Option<u64>,
    capacity: Option<usize>,
) -> Result<RunConfig> {
    let mut resolved = match config {
        Some(path) => RunConfig::from_json_file(&path)?,
        None => RunConfig::new(
            input.clone().context("--input is required without --config")?,
            output.clone().context("--output is required without --config")?,
            generations.context("--generations is required without --config")?,
        ),
    };

    if let Some(input) = input {
        resolved.input = input;
    }
    if let Some(output) = output {
        resolved.output = output;
    }
    if let Some(generations) = generations {
        resolved.generations = generations;
    }
    if let Some(workers) = workers {
        resolved.workers = workers;
    }
    if let Some(threads) = threads {
        resolved.threads_per_worker = threads;
    }
    if timeout_ms.is_some() {
        resolved.exchange_timeout_ms = timeout_ms;
    }
    if let Some(capacity) = capacity {
        resolved.channel_capacity = capacity;
    }
    Ok(resolved)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Run {
            config,
            input,
            output,
            generations,
            workers,
            threads,
            timeout_ms,
            capacity,
        } => {
            let config = resolve_config(
                config,
                input,
                output,
                generations,
                workers,
                threads,
                timeout_ms,
                capacity,
            )?;
            let report = run_ring(&config).context("simulation aborted")?;
            println!("Total time: {}", report.elapsed.as_millis());
        }
        Command::Pack {
            width,
            height,
            text,
            output,
        } => {
            let vector = fs::read_to_string(&text)
                .with_context(|| format!("reading {}", text.display()))?;
            let vector: String = vector.chars().filter(|&c| c != '\n' && c != '\r').collect();
            let grid = BitGrid::from_init_vector(width, height, &vector)?;
            store::save_grid(&output, &grid)?;
        }
        Command::Unpack { input } => {
            let grid = store::load_grid(&input)?;
            print!("{}", grid);
        }
    }
    Ok(())
}
