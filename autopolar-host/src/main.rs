//! autopolar-sim
//!
//! Runs batches of automatic polar alignments against a simulated mount
//! and plate solver, then prints a summary table.
//!
//! Logging is controlled with `RUST_LOG` (default `info`; `debug` shows
//! every move).

mod clock;
mod config;
mod observer;
mod simulation;

use std::path::PathBuf;

use anyhow::{bail, Result};
use autopolar_drivers::VirtualClock;
use clap::Parser;
use log::info;

use clock::StdTimebase;
use config::HostConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Simulated automatic polar alignment")]
struct Args {
    /// Configuration file (TOML); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulated runs
    #[arg(short = 'n', long, default_value_t = 20)]
    runs: u32,

    /// Seed of the first run; run i uses seed + i
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Really sleep during settling and solver polling
    #[arg(long)]
    realtime: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            HostConfig::load(path)?
        }
        None => HostConfig::default(),
    };

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("Running {} simulations from seed {}", args.runs, args.seed);
    let report = if args.realtime {
        simulation::run_batch(&config, args.runs, args.seed, StdTimebase::new)
    } else {
        simulation::run_batch(&config, args.runs, args.seed, VirtualClock::new)
    };

    print!("{report}");

    if args.runs > 0 && report.successes() == 0 {
        bail!("no alignment run succeeded");
    }
    Ok(())
}
