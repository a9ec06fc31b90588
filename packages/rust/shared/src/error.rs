//! Error types for billtrack.
//!
//! Library crates use [`BilltrackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Structural mismatches in scraped documents are not an error variant:
//! extractors report them as "nothing found".

use std::path::PathBuf;

/// Top-level error type for all billtrack operations.
#[derive(Debug, thiserror::Error)]
pub enum BilltrackError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Document retrieval failed (timeout, connection failure, non-success status).
    #[error("network error: {0}")]
    Network(String),

    /// Selector compilation or other parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The snapshot store failed to write or read.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, zero concurrency, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BilltrackError>;

impl BilltrackError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
