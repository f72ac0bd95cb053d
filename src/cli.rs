//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use fetchlog::RunConfig;
use fetchlog::config::{resolve_log_level, should_show_progress};
use fetchlog::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use fetchlog::history::DEFAULT_HISTORY_FILE;

/// Download files from URLs, skipping anything already downloaded.
///
/// A history file remembers every URL fetched and the filename it produced,
/// so repeated runs only download what is new.
#[derive(Parser, Debug)]
#[command(name = "fetchlog")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to download (read from stdin, one per line, when omitted)
    pub urls: Vec<String>,

    /// Directory to save downloads into (created if missing)
    #[arg(short = 'o', long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// History file path
    #[arg(long = "history", default_value = DEFAULT_HISTORY_FILE, value_name = "FILE")]
    pub history: PathBuf,

    /// Download even if the URL or filename is already in history
    #[arg(short, long)]
    pub force: bool,

    /// Print the download history and exit
    #[arg(long)]
    pub list: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Connection timeout in seconds (1-3600)
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// Seconds to wait for more data before giving up on a transfer (1-3600)
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and hide the progress bar (result lines are still printed)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Resolves flags against the terminal environment.
    pub fn to_run_config(&self, stderr_is_terminal: bool, dumb_terminal: bool) -> RunConfig {
        RunConfig {
            output_dir: self.output_dir.clone(),
            history_path: self.history.clone(),
            force: self.force,
            list_only: self.list,
            show_progress: should_show_progress(
                self.no_progress,
                self.quiet,
                stderr_is_terminal,
                dumb_terminal,
            ),
            connect_timeout_secs: self.connect_timeout,
            read_timeout_secs: self.read_timeout,
            log_level: resolve_log_level(self.verbose, self.quiet),
        }
    }
}
