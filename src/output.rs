//! User-facing result lines.
//!
//! These are the lines a person reads, not log records: they go to
//! stdout (results) or stderr (errors and warnings) regardless of the
//! tracing level.

use std::fmt::Write as _;

use indicatif::HumanBytes;

use crate::history::History;
use crate::orchestrator::{FetchJob, Outcome};

/// Characters of a URL shown in list mode before the ellipsis.
pub const URL_PREVIEW_CHARS: usize = 80;

/// A line bound for one of the two standard streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Regular result output.
    Stdout(String),
    /// Errors and warnings.
    Stderr(String),
}

impl Line {
    /// Writes the line to its stream.
    pub fn emit(&self) {
        match self {
            Self::Stdout(text) => println!("{text}"),
            Self::Stderr(text) => eprintln!("{text}"),
        }
    }
}

/// Human-readable byte count (`1.50 MiB`).
#[must_use]
pub fn format_size(bytes: u64) -> String {
    HumanBytes(bytes).to_string()
}

/// First [`URL_PREVIEW_CHARS`] characters of `url` followed by `...`.
///
/// The ellipsis is appended unconditionally to keep list output uniform.
#[must_use]
pub fn url_preview(url: &str) -> String {
    let mut preview: String = url.chars().take(URL_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Renders list mode output, one entry per known filename.
#[must_use]
pub fn render_history(history: &History) -> String {
    if history.downloads().is_empty() {
        return "No downloads in history\n".to_string();
    }

    let files = history.downloaded_files();
    let mut out = format!("Downloaded files ({}):\n", files.len());
    for (filename, url) in files {
        let _ = writeln!(out, "  {filename}");
        let _ = writeln!(out, "    URL: {}", url_preview(url));
    }
    out
}

/// Line printed when a transfer starts.
#[must_use]
pub fn downloading_line(job: &FetchJob) -> Line {
    Line::Stdout(format!("Downloading: {}", job.filename))
}

/// Lines reporting a URL's terminal state.
#[must_use]
pub fn outcome_lines(outcome: &Outcome) -> Vec<Line> {
    match outcome {
        Outcome::Dropped => Vec::new(),
        Outcome::SkippedByUrl { local_path, .. } => {
            vec![Line::Stdout(format!("SKIP (same URL): {local_path}"))]
        }
        Outcome::SkippedByFilename { filename, .. } => {
            vec![Line::Stdout(format!("SKIP (already have): {filename}"))]
        }
        Outcome::Succeeded {
            path,
            bytes,
            persist_error,
            ..
        } => {
            let mut lines = Vec::with_capacity(2);
            if let Some(error) = persist_error {
                lines.push(Line::Stderr(format!(
                    "Warning: could not save history: {error}"
                )));
            }
            lines.push(Line::Stdout(format!(
                "OK: {} ({})",
                path.display(),
                format_size(*bytes)
            )));
            lines
        }
        Outcome::Failed { url, error } => vec![Line::Stderr(format!("ERROR: {url}: {error}"))],
    }
}
