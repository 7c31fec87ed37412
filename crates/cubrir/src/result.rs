//! Result and error types for Cubrir.

use thiserror::Error;

/// Result type for Cubrir operations
pub type CubrirResult<T> = Result<T, CubrirError>;

/// Errors that can occur in Cubrir
#[derive(Debug, Error)]
pub enum CubrirError {
    /// Source text could not be parsed during amendment
    #[error("parse error in {file}:{line}: {message}")]
    Parse {
        /// File being amended
        file: String,
        /// Best-known 1-based line number of the failure
        line: u32,
        /// Parser diagnostic
        message: String,
    },

    /// A count file did not follow the fixed-column format
    #[error("malformed count file {file}:{line}")]
    MalformedCount {
        /// Count file path
        file: String,
        /// 1-based line number of the bad field
        line: u32,
    },

    /// An allocation log did not follow the fixed-column format
    #[error("malformed allocation log {file}:{line}")]
    MalformedMalloc {
        /// Log file path
        file: String,
        /// 1-based line number of the bad field
        line: u32,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CubrirError {
    /// Create a parse error
    #[must_use]
    pub fn parse(file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}
