//! Error types for linchpin-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for linchpin-jsonl operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error at line {line_number}: {source}")]
    Json {
        /// 1-based line number of the offending record (0 when writing).
        line_number: usize,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid JSONL format.
    #[error("Invalid JSONL format: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            line_number: 0,
            source,
        }
    }
}

/// A specialized Result type for linchpin-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
