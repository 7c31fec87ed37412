//! Line coverage data model.
//!
//! The unit of account is the [`LineCount`]: `None` means a line cannot
//! meaningfully execute (blank, comment, declaration-only), `Some(n)` means it
//! was reachable and ran `n` times. `None` and `Some(0)` are distinct
//! everywhere; neither merging nor serialization may conflate them.

mod amend;
mod merge;

#[cfg(test)]
mod tests;

pub use amend::{amend_coverage, AmendConfig, ExclusionMarkers};
pub use merge::{merge_counts, merge_counts_into, merge_records};

use serde::{Deserialize, Serialize};

/// Execution count of one source line, or `None` when not applicable.
pub type LineCount = Option<u64>;

/// Per-file line coverage record.
///
/// `coverage` is indexed 1-based by source line number; the vector may be
/// shorter than the file when a producer only reported up to the last
/// executable line. Extension is always additive (padding with `None`),
/// never truncating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCoverage {
    /// Source file path, the join key across merges and processes.
    pub filename: String,
    /// Raw file text; empty when unknown (e.g. after LCOV deserialization).
    pub source: String,
    /// Per-line counts, index 0 holding line 1.
    pub coverage: Vec<LineCount>,
}

impl FileCoverage {
    /// Create a record from its parts.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        source: impl Into<String>,
        coverage: Vec<LineCount>,
    ) -> Self {
        Self {
            filename: filename.into(),
            source: source.into(),
            coverage,
        }
    }

    /// Create an empty record for the given path.
    #[must_use]
    pub fn empty(filename: impl Into<String>) -> Self {
        Self::new(filename, "", Vec::new())
    }

    /// Grow the coverage vector to hold the given 1-based line, padding new
    /// slots with `None`. Never shrinks.
    pub fn ensure_line(&mut self, line: u32) {
        let needed = line as usize;
        if self.coverage.len() < needed {
            self.coverage.resize(needed, None);
        }
    }

    /// Count of one 1-based line, `None` when not applicable or out of range.
    #[must_use]
    pub fn line_count(&self, line: u32) -> LineCount {
        if line == 0 {
            return None;
        }
        self.coverage.get(line as usize - 1).copied().flatten()
    }

    /// Covered/total executable line summary for this record.
    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        let total = self.coverage.iter().filter(|c| c.is_some()).count() as u64;
        let covered = self
            .coverage
            .iter()
            .filter(|c| matches!(c, Some(n) if *n > 0))
            .count() as u64;
        CoverageSummary { covered, total }
    }
}

/// Covered/total executable line counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Executable lines with a count greater than zero.
    pub covered: u64,
    /// All executable lines (concrete count, including zero).
    pub total: u64,
}

impl CoverageSummary {
    /// Coverage percentage; vacuously 100% for zero executable lines.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.covered as f64 / self.total as f64) * 100.0
    }

    /// Accumulate another summary into this one.
    pub fn add(&mut self, other: CoverageSummary) {
        self.covered += other.covered;
        self.total += other.total;
    }
}

/// Summarize a collection of records.
#[must_use]
pub fn summarize(records: &[FileCoverage]) -> CoverageSummary {
    let mut total = CoverageSummary::default();
    for record in records {
        total.add(record.summary());
    }
    total
}

#[cfg(test)]
mod model_tests {
    use super::*;

    #[test]
    fn test_summary_empty_record() {
        let record = FileCoverage::empty("a.jl");
        assert_eq!(record.summary(), CoverageSummary { covered: 0, total: 0 });
    }

    #[test]
    fn test_summary_counts_zero_as_executable() {
        let record = FileCoverage::new("a.jl", "", vec![None, Some(2), Some(0)]);
        assert_eq!(record.summary(), CoverageSummary { covered: 1, total: 2 });
    }

    #[test]
    fn test_percent_vacuous_on_empty() {
        assert!((CoverageSummary::default().percent() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ensure_line_pads_never_truncates() {
        let mut record = FileCoverage::new("a.jl", "", vec![Some(1)]);
        record.ensure_line(3);
        assert_eq!(record.coverage, vec![Some(1), None, None]);
        record.ensure_line(1);
        assert_eq!(record.coverage.len(), 3);
    }

    #[test]
    fn test_line_count_is_one_based() {
        let record = FileCoverage::new("a.jl", "", vec![Some(7), None]);
        assert_eq!(record.line_count(0), None);
        assert_eq!(record.line_count(1), Some(7));
        assert_eq!(record.line_count(2), None);
        assert_eq!(record.line_count(99), None);
    }

    #[test]
    fn test_summarize_collection() {
        let records = vec![
            FileCoverage::new("a.jl", "", vec![Some(1), Some(0)]),
            FileCoverage::new("b.jl", "", vec![None, Some(3)]),
        ];
        assert_eq!(summarize(&records), CoverageSummary { covered: 2, total: 3 });
    }
}
