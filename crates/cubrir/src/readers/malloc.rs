//! Memory-allocation log reader.
//!
//! Allocation-tracking runs drop one `<source>.<pid>.mem` file per process,
//! with one row per source line: a leading byte count (or `-` when the line
//! never allocated) followed by the line's text.

use crate::result::{CubrirError, CubrirResult};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Bytes allocated at one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MallocInfo {
    /// Bytes allocated.
    pub bytes: u64,
    /// Source file the log belongs to.
    pub filename: String,
    /// 1-based line number.
    pub linenumber: u32,
}

/// Recursively collect `.mem` files under a folder, sorted.
///
/// # Errors
///
/// Returns error if a directory cannot be read.
pub fn find_malloc_files(dir: &Path) -> CubrirResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(find_malloc_files(&path)?);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "mem")
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse allocation logs into rows sorted by descending byte count.
///
/// Rows whose field is `-` or `0` are dropped; the reported filename is the
/// log path with its `.<pid>.mem` suffix stripped.
///
/// # Errors
///
/// Returns error if a file cannot be read or a field is malformed.
pub fn analyze_malloc_files(files: &[PathBuf]) -> CubrirResult<Vec<MallocInfo>> {
    let suffix = Regex::new(r"\.\d+\.mem$").expect("malloc suffix pattern is valid");
    let mut rows = Vec::new();
    for path in files {
        let display = path.display().to_string();
        let filename = suffix.replace(&display, "").into_owned();
        let text = std::fs::read_to_string(path)?;
        for (i, line) in text.lines().enumerate() {
            let Some(field) = line.split_whitespace().next() else {
                continue;
            };
            if field == "-" {
                continue;
            }
            let bytes = field
                .parse::<u64>()
                .map_err(|_| CubrirError::MalformedMalloc {
                    file: display.clone(),
                    line: i as u32 + 1,
                })?;
            if bytes > 0 {
                rows.push(MallocInfo {
                    bytes,
                    filename: filename.clone(),
                    linenumber: i as u32 + 1,
                });
            }
        }
    }
    rows.sort_by(|a, b| {
        b.bytes
            .cmp(&a.bytes)
            .then_with(|| a.filename.cmp(&b.filename))
            .then_with(|| a.linenumber.cmp(&b.linenumber))
    });
    Ok(rows)
}

/// Find and analyze every allocation log under a folder.
///
/// # Errors
///
/// Returns error if the folder or a log cannot be read.
pub fn analyze_malloc(dir: &Path) -> CubrirResult<Vec<MallocInfo>> {
    let files = find_malloc_files(dir)?;
    analyze_malloc_files(&files)
}
