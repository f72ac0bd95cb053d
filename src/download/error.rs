//! Error types for the download module.
//!
//! Every failure carries the URL or path it happened on, so a batch run can
//! report each URL's failure on its own line and carry on.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error from the response body stream.
pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while fetching a single URL.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while creating or writing the output file.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The response body failed part-way through the streamed copy.
    #[error("transfer of {url} to {path} failed: {source}")]
    Body {
        /// The URL being streamed.
        url: String,
        /// The partially written output file (already removed).
        path: PathBuf,
        /// The underlying stream error.
        #[source]
        source: BodyError,
    },

    /// The transfer was aborted by an interrupt signal.
    #[error("download of {url} interrupted")]
    Interrupted {
        /// The URL whose transfer was aborted.
        url: String,
    },
}

/// Coarse failure classes used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport failure before any bytes hit the disk.
    Network,
    /// The server answered with a non-success status.
    HttpStatus,
    /// Streaming to disk failed; the partial file was removed.
    Transfer,
    /// The run was interrupted mid-transfer.
    Interrupted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::HttpStatus => "http_status",
            Self::Transfer => "transfer",
            Self::Interrupted => "interrupted",
        };
        f.write_str(label)
    }
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a body stream error.
    pub fn body(url: impl Into<String>, path: impl Into<PathBuf>, source: BodyError) -> Self {
        Self::Body {
            url: url.into(),
            path: path.into(),
            source,
        }
    }

    /// Creates an interrupted error.
    pub fn interrupted(url: impl Into<String>) -> Self {
        Self::Interrupted { url: url.into() }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::InvalidUrl { .. } => {
                FailureKind::Network
            }
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::Io { .. } | Self::Body { .. } => FailureKind::Transfer,
            Self::Interrupted { .. } => FailureKind::Interrupted,
        }
    }

    /// Returns the HTTP status for [`DownloadError::HttpStatus`].
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
