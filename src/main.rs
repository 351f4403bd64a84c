mod aggregator;
mod config;
mod engine;
mod estimator;
mod manager;
mod model;
mod stats;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Directory holding config.toml and saved simulation results.
    #[arg(long)]
    sim_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the configured number of trials and save the summary.
    Simulate,

    /// Print the summary statistics of a saved simulation.
    Report {
        #[arg(long)]
        seq: Option<usize>,
    },

    /// Export a saved simulation to tab-separated text files.
    Export {
        #[arg(long)]
        seq: Option<usize>,
    },

    /// Compute a standalone Chapman point estimate from catch counts.
    Estimate {
        #[arg(long)]
        marked: usize,
        #[arg(long)]
        caught: usize,
        #[arg(long)]
        recaptured: usize,
    },

    /// Delete all saved results and exports.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    match args.command {
        Command::Estimate {
            marked,
            caught,
            recaptured,
        } => {
            let estimate = estimator::point_estimate(marked, caught, recaptured)?;
            log::info!("estimated population: {estimate}");
        }
        command => {
            let sim_dir = args.sim_dir.context("--sim-dir is required")?;
            let mgr = Manager::new(sim_dir).context("failed to construct mgr")?;

            match command {
                Command::Simulate => mgr.run_simulation()?,
                Command::Report { seq } => mgr.report(seq)?,
                Command::Export { seq } => mgr.export(seq)?,
                Command::Clean => mgr.clean()?,
                Command::Estimate { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}
