//! Headless scenario runner
//!
//! Loads weapon rules and a scenario, runs the world for a number of ticks
//! and prints the events plus the final snapshot.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ordnance::core::error::Result;
use ordnance::rules::WeaponRules;
use ordnance::scenario::{Scenario, ScenarioReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Ordnance - deterministic projectile and warhead simulation
#[derive(Parser, Debug)]
#[command(name = "ordnance")]
#[command(about = "Run a weapon scenario headlessly and print the resulting events")]
struct Args {
    /// Weapon rules: a TOML file, or a directory of them
    #[arg(long)]
    rules: PathBuf,

    /// Scenario TOML file
    #[arg(long)]
    scenario: PathBuf,

    /// Ticks to simulate
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Synchronized seed, overriding the scenario's
    #[arg(long)]
    seed: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Debug-level logging unless RUST_LOG is set
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn load_rules(path: &Path) -> Result<WeaponRules> {
    let rules = if path.is_dir() {
        WeaponRules::load_dir(path)?
    } else {
        WeaponRules::load_file(path)?
    };
    Ok(rules)
}

fn run(args: &Args) -> Result<ScenarioReport> {
    let rules = Arc::new(load_rules(&args.rules)?);
    let scenario = Scenario::load(&args.scenario)?;
    scenario.run(rules, args.ticks, args.seed)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "ordnance=debug" } else { "ordnance=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();

    let report = match run(&args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match args.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {e}");
                return ExitCode::FAILURE;
            }
        },
        OutputFormat::Text => print!("{}", report.summary()),
    }
    ExitCode::SUCCESS
}
