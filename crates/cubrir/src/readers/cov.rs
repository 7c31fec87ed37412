//! Raw per-process count files and folder processing.
//!
//! Instrumented runs drop one `<source>.<pid>.cov` file per process next to
//! each source file. Every line holds a fixed-width 9-character leading field:
//! a right-aligned execution count, or a `-` in the final column meaning the
//! runtime never compiled that line.

use crate::coverage::{
    amend_coverage, merge_counts_into, AmendConfig, FileCoverage, LineCount,
};
use crate::result::{CubrirError, CubrirResult};
use crate::syntax::{frontend::BlockFrontend, resolve_syntax_version};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Width of the leading count field in a `.cov` file.
pub const COUNT_FIELD_WIDTH: usize = 9;

/// Top-level processing configuration.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Run the amendment pass after merging raw counts.
    pub amend: bool,
    /// Amendment settings (exclusion marker spellings).
    pub amend_config: AmendConfig,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            amend: true,
            amend_config: AmendConfig::default(),
        }
    }
}

/// Decode one count-file line's leading field.
fn decode_count_field(line: &str, file: &Path, lineno: u32) -> CubrirResult<LineCount> {
    let field: String = line.chars().take(COUNT_FIELD_WIDTH).collect();
    let field = field.trim();
    if field == "-" || field.is_empty() {
        return Ok(None);
    }
    field
        .parse::<u64>()
        .map(Some)
        .map_err(|_| CubrirError::MalformedCount {
            file: file.display().to_string(),
            line: lineno,
        })
}

/// Read one `.cov` file into a count vector.
///
/// # Errors
///
/// Returns error if the file cannot be read or a field is malformed.
pub fn read_count_file(path: &Path) -> CubrirResult<Vec<LineCount>> {
    let text = std::fs::read_to_string(path)?;
    let mut counts = Vec::new();
    for (i, line) in text.lines().enumerate() {
        counts.push(decode_count_field(line, path, i as u32 + 1)?);
    }
    Ok(counts)
}

/// Find every per-process count file (`<name>.<pid>.cov`) for a source file,
/// sorted for deterministic merge order.
///
/// # Errors
///
/// Returns error if the containing directory cannot be read.
pub fn find_count_files(source: &Path) -> CubrirResult<Vec<PathBuf>> {
    let dir = source.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.unwrap_or_else(|| Path::new("."));
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let pattern = Regex::new(&format!(r"^{}\.\d+\.cov$", regex::escape(name)))
        .expect("count file pattern is valid");
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| pattern.is_match(n))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Process one source file: read its text, merge counts across processes,
/// and amend (when enabled).
///
/// Missing count data is not an error: the record degrades to an all-absent
/// vector spanning the file.
///
/// # Errors
///
/// Returns error on I/O failure, a malformed count field, or a fatal parse
/// error during amendment.
pub fn process_file(path: &Path, config: &ProcessConfig) -> CubrirResult<FileCoverage> {
    let source = std::fs::read_to_string(path)?;
    let count_files = find_count_files(path)?;
    let mut counts: Vec<LineCount> = Vec::new();
    if count_files.is_empty() {
        info!(file = %path.display(), "no coverage data found, treating as not run");
        counts.resize(source.lines().count(), None);
    } else {
        for count_file in &count_files {
            let process_counts = read_count_file(count_file)?;
            merge_counts_into(&mut counts, &process_counts);
        }
    }
    let mut record = FileCoverage::new(path.display().to_string(), source, counts);
    if config.amend {
        let frontend = BlockFrontend::new(resolve_syntax_version(path));
        amend_coverage(&mut record, &frontend, &config.amend_config)?;
    }
    Ok(record)
}

/// Process every source file with the given extension under a folder.
///
/// Per-file parse failures are logged and skipped at this layer; only I/O
/// failures on the folder itself propagate.
///
/// # Errors
///
/// Returns error if a directory cannot be read.
pub fn process_folder(
    dir: &Path,
    extension: &str,
    config: &ProcessConfig,
) -> CubrirResult<Vec<FileCoverage>> {
    let mut records = Vec::new();
    for path in walk_sources(dir, extension)? {
        info!(file = %path.display(), "processing coverage");
        match process_file(&path, config) {
            Ok(record) => records.push(record),
            Err(err) => warn!(file = %path.display(), %err, "skipping file"),
        }
    }
    Ok(records)
}

/// Remove the count files belonging to one source file.
///
/// # Errors
///
/// Returns error if the directory cannot be read or a removal fails.
pub fn clean_file(source: &Path) -> CubrirResult<usize> {
    let files = find_count_files(source)?;
    for file in &files {
        std::fs::remove_file(file)?;
    }
    Ok(files.len())
}

/// Remove every `.cov` and `.mem` instrumentation dropping under a folder.
///
/// # Errors
///
/// Returns error if a directory cannot be read or a removal fails.
pub fn clean_folder(dir: &Path) -> CubrirResult<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            removed += clean_folder(&path)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "cov" || e == "mem")
        {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Recursively collect source files with the given extension, sorted.
fn walk_sources(dir: &Path, extension: &str) -> CubrirResult<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            sources.extend(walk_sources(&path, extension)?);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == extension)
        {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}
