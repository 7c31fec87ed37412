//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Cubridor: CLI for Cubrir - merge coverage counts and publish LCOV traces
#[derive(Parser, Debug)]
#[command(name = "cubridor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process an instrumented source folder into an LCOV trace
    Process(ProcessArgs),

    /// Merge LCOV traces into one
    Merge(MergeArgs),

    /// Print a coverage summary for LCOV traces
    Summary(SummaryArgs),

    /// Remove .cov and .mem instrumentation droppings
    Clean(CleanArgs),

    /// Report top allocation sites from .mem logs
    Malloc(MallocArgs),
}

/// Arguments for the process command
#[derive(Parser, Debug)]
pub struct ProcessArgs {
    /// Folder of instrumented sources and their count files
    pub folder: PathBuf,

    /// Source file extension to process
    #[arg(short, long, default_value = "jl")]
    pub extension: String,

    /// Output trace path
    #[arg(short, long, default_value = "lcov.info")]
    pub output: PathBuf,

    /// Skip the amendment pass (keep raw counts)
    #[arg(long)]
    pub no_amend: bool,
}

/// Arguments for the merge command
#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// Trace files or folders of traces to merge
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output trace path
    #[arg(short, long, default_value = "lcov.info")]
    pub output: PathBuf,
}

/// Arguments for the summary command
#[derive(Parser, Debug)]
pub struct SummaryArgs {
    /// Trace files to summarize
    #[arg(required = true)]
    pub traces: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: SummaryFormat,
}

/// Summary output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    /// Human-readable table
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// Arguments for the clean command
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Folder to clean recursively
    pub folder: PathBuf,
}

/// Arguments for the malloc command
#[derive(Parser, Debug)]
pub struct MallocArgs {
    /// Folder holding .mem allocation logs
    pub folder: PathBuf,

    /// Number of top allocation sites to print
    #[arg(short, long, default_value = "10")]
    pub top: usize,
}
