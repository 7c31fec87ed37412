//! Syntax tree model and the pluggable statement parser capability.
//!
//! The amendment engine does not parse source text itself. It consumes a
//! generic tagged tree annotated with fragment-relative line markers, produced
//! one top-level statement at a time by a [`StatementParser`]. The bundled
//! [`frontend::BlockFrontend`] implements the trait for `function … end`
//! block-structured sources; any other front end with the same contract can be
//! substituted.

mod body_lines;
pub mod frontend;
mod index;

pub use body_lines::{first_error_line, function_body_lines};
pub use index::LineIndex;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Kind tag of a syntax tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Named function or macro definition; children are the body.
    Function,
    /// Anonymous function (`->` or `do` block); children are the body.
    Lambda,
    /// Non-function block (`if`, `for`, `struct`, `module`, …).
    Block,
    /// A line marker: one line of code within its container.
    Line,
    /// A locally recovered syntax problem.
    Error,
}

impl NodeKind {
    /// Whether lines under this node belong to an executable function body.
    #[must_use]
    pub fn is_function_like(self) -> bool {
        matches!(self, Self::Function | Self::Lambda)
    }
}

/// One node of the tagged syntax tree.
///
/// `line` is 1-based and relative to the line on which the containing
/// fragment's parse started; the amendment engine shifts it by the fragment's
/// line offset to obtain an absolute file line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNode {
    /// Kind tag.
    pub kind: NodeKind,
    /// Fragment-relative 1-based line number, when the node marks one.
    pub line: Option<u32>,
    /// Nested nodes. For function-like nodes these form the body.
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Create a node with no line marker and no children.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            line: None,
            children: Vec::new(),
        }
    }

    /// Create a node carrying a fragment-relative line marker.
    #[must_use]
    pub fn at_line(kind: NodeKind, line: u32) -> Self {
        Self {
            kind,
            line: Some(line),
            children: Vec::new(),
        }
    }
}

/// Outcome of parsing one top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// A statement tree. May contain embedded [`NodeKind::Error`] nodes for
    /// locally recovered problems; the caller decides whether those are fatal.
    Fragment(SyntaxNode),
    /// The statement started but the text ended before it closed.
    Incomplete(String),
    /// Unrecoverable failure for this fragment. An empty message (or one
    /// containing "premature end of input") with the position at or past the
    /// text end signals benign end-of-input.
    Failed(String),
}

/// One step of incremental parsing: the outcome plus the next byte position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStep {
    /// What the parser produced for this fragment.
    pub parsed: Parsed,
    /// Byte position at which the next statement starts.
    pub next_pos: usize,
}

/// The injected parsing capability consumed by the amendment engine.
///
/// `parse_next` consumes exactly one top-level statement starting at `pos`
/// (skipping leading blank and comment-only lines) and reports where the next
/// one begins. Line markers in the returned tree are relative to the line
/// containing `pos`.
pub trait StatementParser {
    /// Parse one top-level statement of `source` starting at byte `pos`.
    fn parse_next(&self, source: &str, pos: usize) -> ParseStep;
}

/// Syntax version tag fed to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

/// Fixed default used when no descriptor or marker file is found.
pub const DEFAULT_SYNTAX_VERSION: SyntaxVersion = SyntaxVersion {
    major: 1,
    minor: 11,
};

impl Default for SyntaxVersion {
    fn default() -> Self {
        DEFAULT_SYNTAX_VERSION
    }
}

impl fmt::Display for SyntaxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl SyntaxVersion {
    /// Parse an `"X.Y"` version string.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (major, minor) = text.trim().split_once('.')?;
        Some(Self {
            major: major.trim().parse().ok()?,
            minor: minor.trim().parse().ok()?,
        })
    }
}

/// Project descriptor scanned for a `syntax = "X.Y"` entry.
pub const PROJECT_DESCRIPTOR: &str = "Project.toml";

/// Marker file holding a bare `X.Y` version.
pub const VERSION_MARKER: &str = ".syntax-version";

/// Resolve the syntax version governing `path`.
///
/// Walks parent directories looking for a [`VERSION_MARKER`] file or a
/// [`PROJECT_DESCRIPTOR`] with a `syntax = "X.Y"` entry; the first hit wins.
/// Falls back to [`DEFAULT_SYNTAX_VERSION`] when neither is found.
#[must_use]
pub fn resolve_syntax_version(path: &Path) -> SyntaxVersion {
    let mut dir = if path.is_dir() {
        Some(path)
    } else {
        path.parent()
    };
    while let Some(d) = dir {
        let marker = d.join(VERSION_MARKER);
        if let Ok(text) = std::fs::read_to_string(&marker) {
            if let Some(version) = SyntaxVersion::parse(&text) {
                debug!(marker = %marker.display(), %version, "resolved syntax version");
                return version;
            }
        }
        let descriptor = d.join(PROJECT_DESCRIPTOR);
        if let Ok(text) = std::fs::read_to_string(&descriptor) {
            if let Some(version) = descriptor_version(&text) {
                debug!(descriptor = %descriptor.display(), %version, "resolved syntax version");
                return version;
            }
        }
        dir = d.parent();
    }
    debug!(path = %path.display(), "no version descriptor found, using default");
    DEFAULT_SYNTAX_VERSION
}

/// Extract a `syntax = "X.Y"` entry from descriptor text.
fn descriptor_version(text: &str) -> Option<SyntaxVersion> {
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("syntax") {
            let rest = rest.trim_start();
            if let Some(value) = rest.strip_prefix('=') {
                let value = value.trim().trim_matches('"');
                return SyntaxVersion::parse(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_version_parse() {
        assert_eq!(
            SyntaxVersion::parse("1.11"),
            Some(SyntaxVersion {
                major: 1,
                minor: 11
            })
        );
        assert_eq!(SyntaxVersion::parse("2.0\n"), Some(SyntaxVersion { major: 2, minor: 0 }));
        assert_eq!(SyntaxVersion::parse("nope"), None);
    }

    #[test]
    fn test_version_display() {
        assert_eq!(DEFAULT_SYNTAX_VERSION.to_string(), "1.11");
    }

    #[test]
    fn test_descriptor_version() {
        let text = "name = \"demo\"\nsyntax = \"1.9\"\n";
        assert_eq!(
            descriptor_version(text),
            Some(SyntaxVersion { major: 1, minor: 9 })
        );
        assert_eq!(descriptor_version("name = \"demo\"\n"), None);
    }

    #[test]
    fn test_resolve_defaults_without_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("src.jl");
        fs::write(&file, "x = 1\n").unwrap();
        assert_eq!(resolve_syntax_version(&file), DEFAULT_SYNTAX_VERSION);
    }

    #[test]
    fn test_resolve_walks_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(VERSION_MARKER), "1.6\n").unwrap();
        let file = nested.join("src.jl");
        fs::write(&file, "x = 1\n").unwrap();
        assert_eq!(
            resolve_syntax_version(&file),
            SyntaxVersion { major: 1, minor: 6 }
        );
    }

    #[test]
    fn test_resolve_reads_project_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_DESCRIPTOR),
            "name = \"demo\"\nsyntax = \"1.10\"\n",
        )
        .unwrap();
        let file = dir.path().join("src.jl");
        fs::write(&file, "x = 1\n").unwrap();
        assert_eq!(
            resolve_syntax_version(&file),
            SyntaxVersion {
                major: 1,
                minor: 10
            }
        );
    }

    #[test]
    fn test_marker_wins_over_descriptor_in_same_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(VERSION_MARKER), "1.6").unwrap();
        fs::write(dir.path().join(PROJECT_DESCRIPTOR), "syntax = \"1.10\"").unwrap();
        let file = dir.path().join("src.jl");
        fs::write(&file, "x = 1\n").unwrap();
        assert_eq!(
            resolve_syntax_version(&file),
            SyntaxVersion { major: 1, minor: 6 }
        );
    }
}
