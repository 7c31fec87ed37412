//! Cubridor CLI: merge coverage counts and publish LCOV traces
//!
//! ## Usage
//!
//! ```bash
//! cubridor process src/ -o lcov.info   # counts + sources -> LCOV
//! cubridor merge a.info b.info -o all.info
//! cubridor summary all.info --format json
//! cubridor clean src/                  # remove .cov/.mem droppings
//! ```

use clap::Parser;
use cubridor::handlers::{run_clean, run_malloc, run_merge, run_process, run_summary};
use cubridor::{Cli, CliResult, Commands};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Process(args) => run_process(args),
        Commands::Merge(args) => run_merge(args),
        Commands::Summary(args) => run_summary(args),
        Commands::Clean(args) => run_clean(args),
        Commands::Malloc(args) => run_malloc(args),
    }
}

/// Map `-v`/`-q` flags onto a tracing filter; `RUST_LOG` still wins.
fn init_tracing(verbose: u8, quiet: bool) {
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cubrir={default},cubridor={default}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
