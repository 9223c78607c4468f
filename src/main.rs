//! Command line front end for the datafoam pipeline
//!
//! Reads a JSON pipeline description and runs each stage in turn. Stages
//! that fail stop the run with a non-zero exit status.

mod config;
mod error;
mod pipeline;

// standard library
use std::path::PathBuf;
use std::process;

// crate modules
use config::Config;
use pipeline::{run, RunOptions};

// datafoam modules
use datafoam::closure::Execution;

// external crates
use clap::Parser;
use log::{error, info};

/// Convert OpenFOAM case output into turbulence modelling datasets
#[derive(Parser, Debug)]
#[command(version, about, arg_required_else_help = true)]
struct Cli {
    /// Path to the JSON pipeline description
    config: PathBuf,

    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all output
    #[arg(short, long)]
    quiet: bool,

    /// Worker threads for per-cell fits (defaults to the scheduler hint)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,
}

fn main() {
    let cli = Cli::parse();

    stderrlog::new()
        .module(module_path!())
        .module("datafoam_case")
        .module("datafoam_closure")
        .module("datafoam_dataset")
        .module("datafoam_mapping")
        .module("datafoam_store")
        .quiet(cli.quiet)
        .verbosity(cli.verbose as usize + 2)
        .init()
        .unwrap();

    let options = RunOptions {
        execution: match cli.threads {
            Some(threads) => Execution::with_threads(threads),
            None => Execution::from_env(),
        },
        progress: !(cli.quiet || cli.no_progress),
    };
    info!("Using {} worker thread(s)", options.execution.threads());

    let result = Config::read(&cli.config).and_then(|config| run(&config, &options));
    if let Err(e) = result {
        report(&e);
        process::exit(1);
    }
}

/// Log an error along with every underlying cause
fn report(e: &dyn std::error::Error) {
    error!("{e}");
    let mut source = e.source();
    while let Some(cause) = source {
        error!("  caused by: {cause}");
        source = cause.source();
    }
}
