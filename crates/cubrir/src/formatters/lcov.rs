//! LCOV trace reader/writer.
//!
//! ## LCOV format (subset produced)
//!
//! ```text
//! SF:<source file>
//! DA:<line>,<execution count>
//! end_of_record
//! ```
//!
//! One block per record, in collection order; one `DA` entry per line with a
//! concrete count, in ascending line order; lines with no meaningful count
//! carry no entry. Output is byte-for-byte stable since downstream tools
//! compare traces verbatim. The reader accepts full traces from other
//! producers and skips directives it does not model (`TN:`, `LF:`, `FN:` …).

use crate::coverage::FileCoverage;
use crate::result::CubrirResult;
use std::path::Path;
use tracing::warn;

/// LCOV trace writer for a collection of records.
#[derive(Debug)]
pub struct LcovWriter<'a> {
    records: &'a [FileCoverage],
}

impl<'a> LcovWriter<'a> {
    /// Create a writer over the given records.
    #[must_use]
    pub fn new(records: &'a [FileCoverage]) -> Self {
        Self { records }
    }

    /// Generate the LCOV trace as a string.
    #[must_use]
    pub fn generate(&self) -> String {
        use std::fmt::Write;

        let mut output = String::new();
        for record in self.records {
            let _ = writeln!(output, "SF:{}", record.filename);
            for (i, count) in record.coverage.iter().enumerate() {
                if let Some(count) = count {
                    let _ = writeln!(output, "DA:{},{count}", i + 1);
                }
            }
            output.push_str("end_of_record\n");
        }
        output
    }

    /// Save the trace to a file.
    ///
    /// # Errors
    ///
    /// Returns error if the file write fails.
    pub fn save(&self, path: &Path) -> CubrirResult<()> {
        std::fs::write(path, self.generate())?;
        Ok(())
    }
}

/// Parse an LCOV trace into records.
///
/// Each `SF:` block becomes one [`FileCoverage`] with an empty `source` (LCOV
/// does not carry source text) and a coverage vector sized to the highest
/// `DA` line seen. Unrecognized directives are skipped; a malformed `DA`
/// entry is skipped with a warning rather than aborting the read.
#[must_use]
pub fn read_str(text: &str) -> Vec<FileCoverage> {
    let mut records = Vec::new();
    let mut current: Option<FileCoverage> = None;
    for line in text.lines() {
        let line = line.trim_end();
        if let Some(path) = line.strip_prefix("SF:") {
            if let Some(record) = current.replace(FileCoverage::empty(path)) {
                records.push(record);
            }
        } else if line == "end_of_record" {
            if let Some(record) = current.take() {
                records.push(record);
            }
        } else if let Some(entry) = line.strip_prefix("DA:") {
            let Some(record) = current.as_mut() else {
                warn!(line, "DA entry outside SF block");
                continue;
            };
            // DA:<line>,<count>[,<checksum>]
            let mut fields = entry.split(',');
            let parsed = match (fields.next(), fields.next()) {
                (Some(lineno), Some(count)) => {
                    lineno.trim().parse::<u32>().ok().zip(count.trim().parse::<u64>().ok())
                }
                _ => None,
            };
            match parsed {
                Some((lineno, count)) if lineno > 0 => {
                    record.ensure_line(lineno);
                    record.coverage[lineno as usize - 1] = Some(count);
                }
                _ => warn!(line, "skipping malformed DA entry"),
            }
        }
        // TN:, LF:, LH:, FN*, BR* and friends are not modeled
    }
    if let Some(record) = current.take() {
        records.push(record);
    }
    records
}

/// Read one LCOV trace file.
///
/// # Errors
///
/// Returns error if the file cannot be read.
pub fn read_file(path: &Path) -> CubrirResult<Vec<FileCoverage>> {
    Ok(read_str(&std::fs::read_to_string(path)?))
}

/// Read every trace file (`.info` or `.lcov`) in a folder, concatenating
/// their records without merging; merging is a separate explicit step.
///
/// # Errors
///
/// Returns error if the folder or a trace file cannot be read.
pub fn read_folder(dir: &Path) -> CubrirResult<Vec<FileCoverage>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "info" || e == "lcov")
        })
        .collect();
    entries.sort();
    let mut records = Vec::new();
    for path in entries {
        records.extend(read_file(&path)?);
    }
    Ok(records)
}
