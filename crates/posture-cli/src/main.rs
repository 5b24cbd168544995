//! Posture CLI
//!
//! Drives the reporting pipeline over a directory of raw exports per month
//! and an append-only snapshot store.

use anyhow::Result;
use clap::{Parser, Subcommand};
use posture_model::Period;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;
mod logging;

use config::PostureConfig;

#[derive(Parser)]
#[command(name = "posture")]
#[command(version)]
#[command(about = "Monthly security posture reporting pipeline", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a month of raw exports, store its snapshot, print its report
    Ingest {
        /// Reporting period (YYYY-MM)
        #[arg(short, long)]
        period: Period,

        /// Directory holding <source>.json row files
        #[arg(short, long, value_name = "DIR")]
        input: PathBuf,

        /// Replace an already stored period (only the latest one)
        #[arg(long)]
        replace: bool,
    },

    /// Recompute a stored period's report
    Report {
        /// Reporting period (YYYY-MM)
        #[arg(short, long)]
        period: Period,
    },

    /// Recompute every stored period's report in parallel
    Regenerate,

    /// Print the report model JSON schema
    Schema,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = PostureConfig::load(cli.config.as_deref())?;
    logging::init_logging(&config.logging, cli.log_json)?;

    match cli.command {
        Commands::Ingest {
            period,
            input,
            replace,
        } => {
            let report = commands::ingest(&config, period, &input, replace)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Report { period } => {
            let report = commands::report(&config.store(), &config.policy, period)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Regenerate => {
            let regenerated = commands::regenerate(&config.store(), &config.policy)?;
            println!("{}", serde_json::to_string_pretty(&regenerated.reports)?);
            if !regenerated.failures.is_empty() {
                for (period, error) in &regenerated.failures {
                    eprintln!("{period}: {error}");
                }
                eprintln!("{} period(s) failed", regenerated.failures.len());
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Schema => println!("{}", commands::schema()?),
    }
    Ok(ExitCode::SUCCESS)
}
