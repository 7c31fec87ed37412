//! Cubrir: line coverage reconciliation, merging, and LCOV interchange.
//!
//! Cubrir (Spanish: "to cover") collects per-line execution counts produced
//! by a runtime's coverage instrumentation, reconciles them against the
//! original source text, merges counts across runs and processes, and
//! serializes the result as an LCOV trace for CI dashboards and coverage
//! services.
//!
//! # Pipeline
//!
//! ```text
//! ┌────────────┐    ┌───────────┐    ┌────────────┐    ┌────────────┐
//! │ .cov files │───►│ merge     │───►│ amendment  │───►│ LCOV trace │
//! │ (per proc) │    │ (sum)     │    │ (reclass.) │    │ (SF/DA)    │
//! └────────────┘    └───────────┘    └────────────┘    └────────────┘
//! ```
//!
//! The amendment step upgrades "not applicable" counts to zero for lines
//! that sit inside function bodies the runtime never compiled, then applies
//! exclusion-marker overrides. It consumes a pluggable
//! [`syntax::StatementParser`]; [`syntax::frontend::BlockFrontend`] is the
//! bundled front end for `function … end` block-structured sources.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

pub mod coverage;
pub mod formatters;
pub mod readers;
mod result;
pub mod syntax;

pub use coverage::{
    amend_coverage, merge_counts, merge_counts_into, merge_records, summarize, AmendConfig,
    CoverageSummary, ExclusionMarkers, FileCoverage, LineCount,
};
pub use formatters::LcovWriter;
pub use readers::{process_file, process_folder, ProcessConfig};
pub use result::{CubrirError, CubrirResult};
pub use syntax::{resolve_syntax_version, StatementParser, SyntaxVersion};
