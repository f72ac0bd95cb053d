//! Error types for history persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or saving the history file.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history file exists but could not be read.
    #[error("failed to read history file {path}: {source}")]
    Read {
        /// History file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The history file exists but is not valid history JSON.
    #[error("history file {path} is corrupt: {source}")]
    Corrupt {
        /// History file path.
        path: PathBuf,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },

    /// History could not be serialized.
    #[error("failed to serialize history: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The history file could not be written.
    #[error("failed to write history file {path}: {source}")]
    Write {
        /// History file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl HistoryError {
    /// Returns true for [`HistoryError::Corrupt`].
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}
