//! The amendment engine.
//!
//! Runtimes only instrument lines they actually compile, so the body of a
//! function that was never invoked is reported as "not applicable" instead of
//! "zero". Amendment walks the source text statement by statement, finds every
//! line inside a function or lambda body, and upgrades its count from `None`
//! to `Some(0)` — then applies exclusion-marker overrides, which win over
//! everything, including concrete counts.

use crate::coverage::FileCoverage;
use crate::result::{CubrirError, CubrirResult};
use crate::syntax::{
    first_error_line, function_body_lines, LineIndex, Parsed, StatementParser,
};
use tracing::debug;

/// Exclusion marker tokens looked up in raw source lines.
///
/// The spellings are configuration, not syntax: any line containing `start`
/// opens an excluded region (inclusive), any line containing `stop` closes it
/// (that line itself still excluded), and any line containing `line` is
/// excluded on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionMarkers {
    /// Opens an excluded region.
    pub start: String,
    /// Closes an excluded region.
    pub stop: String,
    /// Excludes a single line.
    pub line: String,
}

impl Default for ExclusionMarkers {
    fn default() -> Self {
        Self {
            start: "COV_EXCL_START".to_string(),
            stop: "COV_EXCL_STOP".to_string(),
            line: "COV_EXCL_LINE".to_string(),
        }
    }
}

/// Amendment configuration.
#[derive(Debug, Clone, Default)]
pub struct AmendConfig {
    /// Exclusion marker spellings.
    pub markers: ExclusionMarkers,
}

/// Amend a record in place using the injected parser.
///
/// Reclassifies `None` counts to `Some(0)` on lines inside function bodies,
/// padding the coverage vector where needed and never overwriting a concrete
/// count, then forces excluded lines back to `None`.
///
/// # Errors
///
/// Returns [`CubrirError::Parse`] when the source is malformed: an incomplete
/// trailing statement, an embedded recovered-error node, or a parser that
/// fails to advance. The error carries the filename and the best-known line.
pub fn amend_coverage<P: StatementParser>(
    record: &mut FileCoverage,
    parser: &P,
    config: &AmendConfig,
) -> CubrirResult<()> {
    let source = record.source.clone();
    let index = LineIndex::new(&source);
    let mut pos = 0;

    while pos < source.len() {
        // Line markers in the fragment are relative to the line holding `pos`.
        let lineoffset = index.line_at(pos) - 1;
        let step = parser.parse_next(&source, pos);
        match step.parsed {
            Parsed::Failed(message) => {
                let benign = step.next_pos >= source.len()
                    && (message.is_empty() || message.contains("premature end of input"));
                if benign {
                    break;
                }
                return Err(CubrirError::parse(
                    &record.filename,
                    index.line_at(pos),
                    message,
                ));
            }
            Parsed::Incomplete(message) => {
                return Err(CubrirError::parse(
                    &record.filename,
                    index.line_at(pos),
                    message,
                ));
            }
            Parsed::Fragment(node) => {
                if let Some(marker) = first_error_line(&node) {
                    let line = lineoffset + marker.unwrap_or(0);
                    return Err(CubrirError::parse(
                        &record.filename,
                        line.max(1),
                        "syntax error",
                    ));
                }
                for rel in function_body_lines(&node) {
                    let line = rel + lineoffset;
                    record.ensure_line(line);
                    let slot = &mut record.coverage[line as usize - 1];
                    if slot.is_none() {
                        *slot = Some(0);
                    }
                }
                if step.next_pos <= pos {
                    return Err(CubrirError::parse(
                        &record.filename,
                        index.line_at(pos),
                        "malformed token: parser failed to advance",
                    ));
                }
                pos = step.next_pos;
            }
        }
    }

    apply_exclusions(record, &config.markers);
    debug!(file = %record.filename, "amendment complete");
    Ok(())
}

/// Second pass over raw lines: force excluded lines to `None`.
///
/// Exclusion wins over amendment, including zeroing out concrete counts.
fn apply_exclusions(record: &mut FileCoverage, markers: &ExclusionMarkers) {
    let source = std::mem::take(&mut record.source);
    let mut region = false;
    for (i, line) in source.lines().enumerate() {
        let mut excluded = region;
        if line.contains(&markers.start) {
            region = true;
            excluded = true;
        }
        if line.contains(&markers.stop) {
            // the stop line itself is still excluded
            excluded = true;
            region = false;
        }
        if line.contains(&markers.line) {
            excluded = true;
        }
        if excluded && i < record.coverage.len() {
            record.coverage[i] = None;
        }
    }
    record.source = source;
}
