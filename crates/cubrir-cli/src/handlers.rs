//! Subcommand handlers.

use crate::commands::{CleanArgs, MallocArgs, MergeArgs, ProcessArgs, SummaryArgs, SummaryFormat};
use crate::error::{CliError, CliResult};
use console::style;
use cubrir::formatters::lcov;
use cubrir::readers::{analyze_malloc, clean_folder};
use cubrir::{
    merge_records, summarize, FileCoverage, LcovWriter, ProcessConfig,
};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Per-file row of the summary report.
#[derive(Debug, Serialize)]
struct FileSummary {
    filename: String,
    covered: u64,
    total: u64,
    percent: f64,
}

/// Whole summary report.
#[derive(Debug, Serialize)]
struct SummaryReport {
    files: Vec<FileSummary>,
    covered: u64,
    total: u64,
    percent: f64,
}

/// Process an instrumented source folder and write an LCOV trace.
pub fn run_process(args: &ProcessArgs) -> CliResult<()> {
    let config = ProcessConfig {
        amend: !args.no_amend,
        ..ProcessConfig::default()
    };
    let records = cubrir::process_folder(&args.folder, &args.extension, &config)?;
    if records.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "no .{} sources found under {}",
            args.extension,
            args.folder.display()
        )));
    }
    LcovWriter::new(&records).save(&args.output)?;
    let totals = summarize(&records);
    info!(trace = %args.output.display(), files = records.len(), "trace written");
    println!(
        "{} {} files, {}/{} lines covered ({:.1}%)",
        style("coverage:").green().bold(),
        records.len(),
        totals.covered,
        totals.total,
        totals.percent()
    );
    Ok(())
}

/// Merge traces (files or folders of traces) into one.
pub fn run_merge(args: &MergeArgs) -> CliResult<()> {
    let mut records = Vec::new();
    for input in &args.inputs {
        records.extend(read_traces(input)?);
    }
    let merged = merge_records([records.as_slice()]);
    LcovWriter::new(&merged).save(&args.output)?;
    println!(
        "{} {} records merged into {}",
        style("merged:").green().bold(),
        merged.len(),
        args.output.display()
    );
    Ok(())
}

/// Print a coverage summary for one or more traces.
pub fn run_summary(args: &SummaryArgs) -> CliResult<()> {
    let mut records = Vec::new();
    for trace in &args.traces {
        records.extend(read_traces(trace)?);
    }
    let merged = merge_records([records.as_slice()]);
    let report = build_report(&merged);
    match args.format {
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        SummaryFormat::Text => print_report(&report),
    }
    Ok(())
}

/// Remove instrumentation droppings under a folder.
pub fn run_clean(args: &CleanArgs) -> CliResult<()> {
    let removed = clean_folder(&args.folder)?;
    println!(
        "{} {} files removed",
        style("cleaned:").green().bold(),
        removed
    );
    Ok(())
}

/// Report the top allocation sites under a folder.
pub fn run_malloc(args: &MallocArgs) -> CliResult<()> {
    let rows = analyze_malloc(&args.folder)?;
    if rows.is_empty() {
        println!("no allocation logs found");
        return Ok(());
    }
    for row in rows.iter().take(args.top) {
        println!("{:>12} bytes  {}:{}", row.bytes, row.filename, row.linenumber);
    }
    Ok(())
}

/// Read a trace file, or every trace in a folder.
fn read_traces(path: &Path) -> CliResult<Vec<FileCoverage>> {
    let records = if path.is_dir() {
        lcov::read_folder(path)?
    } else {
        lcov::read_file(path)?
    };
    Ok(records)
}

fn build_report(records: &[FileCoverage]) -> SummaryReport {
    let files = records
        .iter()
        .map(|record| {
            let summary = record.summary();
            FileSummary {
                filename: record.filename.clone(),
                covered: summary.covered,
                total: summary.total,
                percent: summary.percent(),
            }
        })
        .collect();
    let totals = summarize(records);
    SummaryReport {
        files,
        covered: totals.covered,
        total: totals.total,
        percent: totals.percent(),
    }
}

fn print_report(report: &SummaryReport) {
    for file in &report.files {
        println!(
            "{:>7.1}%  {:>6}/{:<6}  {}",
            file.percent, file.covered, file.total, file.filename
        );
    }
    println!(
        "{} {}/{} lines covered ({:.1}%)",
        style("total:").bold(),
        report.covered,
        report.total,
        report.percent
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_report_totals() {
        let records = vec![
            FileCoverage::new("a.jl", "", vec![Some(1), Some(0)]),
            FileCoverage::new("b.jl", "", vec![None, Some(2), Some(3)]),
        ];
        let report = build_report(&records);
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.covered, 3);
        assert_eq!(report.total, 4);
        assert!((report.percent - 75.0).abs() < f64::EPSILON);
    }
}
