//! Constants for the download module (timeouts, progress, fingerprints).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read idle timeout (5 minutes without any bytes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Minimum wall-clock gap between two progress redraws.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Number of SHA-256 bytes kept in a URL fingerprint (16 hex characters).
pub const FINGERPRINT_BYTES: usize = 8;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
