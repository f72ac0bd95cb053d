//! Run settings resolved from command-line flags and the environment.

use std::path::PathBuf;

use crate::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::history::DEFAULT_HISTORY_FILE;

/// Validated settings for one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Directory downloads are written to (created if missing).
    pub output_dir: PathBuf,
    /// History file location.
    pub history_path: PathBuf,
    /// Bypass history checks.
    pub force: bool,
    /// Only print the history and exit.
    pub list_only: bool,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: u64,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: &'static str,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
            force: false,
            list_only: false,
            show_progress: false,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            log_level: "warn",
        }
    }
}

/// Maps `-q` / `-v` flags to a tracing filter.
///
/// Quiet wins over verbose. Default output is user-facing lines only, so
/// logging starts at `warn`.
#[must_use]
pub fn resolve_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Progress is drawn only on an interactive, capable stderr.
#[must_use]
pub fn should_show_progress(
    no_progress_flag: bool,
    quiet: bool,
    stderr_is_terminal: bool,
    dumb_terminal: bool,
) -> bool {
    !no_progress_flag && !quiet && stderr_is_terminal && !dumb_terminal
}

/// Returns true when `TERM=dumb`.
#[must_use]
pub fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_cli_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.history_path, PathBuf::from(".download_history.json"));
        assert!(!config.force);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.read_timeout_secs, 300);
    }

    #[test]
    fn test_resolve_log_level() {
        assert_eq!(resolve_log_level(0, false), "warn");
        assert_eq!(resolve_log_level(1, false), "debug");
        assert_eq!(resolve_log_level(3, false), "trace");
        assert_eq!(resolve_log_level(2, true), "error");
    }

    #[test]
    fn test_should_show_progress_requires_interactive_terminal() {
        assert!(should_show_progress(false, false, true, false));
        assert!(!should_show_progress(true, false, true, false));
        assert!(!should_show_progress(false, true, true, false));
        assert!(!should_show_progress(false, false, false, false));
        assert!(!should_show_progress(false, false, true, true));
    }
}
