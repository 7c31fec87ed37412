//! Cubridor CLI Library
//!
//! Command-line interface for the Cubrir coverage toolkit.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod error;
pub mod handlers;

pub use commands::{
    CleanArgs, Cli, Commands, MallocArgs, MergeArgs, ProcessArgs, SummaryArgs, SummaryFormat,
};
pub use error::{CliError, CliResult};
