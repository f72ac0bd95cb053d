//! Per-URL download flow.
//!
//! Each requested URL is trimmed and then either skipped (URL or resolved
//! filename already in history), or fetched. Successful fetches are
//! recorded and the history file is saved straight away; a failed save is a
//! warning and the in-memory history keeps deduplicating for the rest of
//! the run. URLs are processed strictly in order, one at a time.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::download::{
    DownloadError, FailureKind, HttpClient, Interrupt, NoProgress, ProgressSink, filename_from_url,
};
use crate::history::{DownloadRecord, HistoryError, HistoryStore};

/// What to do with one requested URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Blank input, silently ignored.
    Drop,
    /// The exact URL is already in history.
    SkipByUrl {
        /// Requested URL (trimmed).
        url: String,
        /// Where the earlier download was written.
        local_path: String,
    },
    /// Another URL already produced the same filename.
    SkipByFilename {
        /// Requested URL (trimmed).
        url: String,
        /// Resolved filename.
        filename: String,
    },
    /// Not known yet (or forced): download it.
    Fetch(FetchJob),
}

/// A URL that is about to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    /// Requested URL (trimmed).
    pub url: String,
    /// Filename resolved from the URL, before collision handling.
    pub filename: String,
}

/// Terminal state of one requested URL.
#[derive(Debug)]
pub enum Outcome {
    /// Blank input.
    Dropped,
    /// Skipped because the exact URL was already downloaded.
    SkippedByUrl {
        /// Requested URL.
        url: String,
        /// Where the earlier download was written.
        local_path: String,
    },
    /// Skipped because the resolved filename was already downloaded.
    SkippedByFilename {
        /// Requested URL.
        url: String,
        /// Resolved filename.
        filename: String,
    },
    /// Downloaded and recorded.
    Succeeded {
        /// Requested URL.
        url: String,
        /// Resolved filename recorded in the filename lookup.
        filename: String,
        /// Where the file was written.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
        /// Set when the history file could not be saved afterwards.
        persist_error: Option<HistoryError>,
    },
    /// The transfer failed; history is unchanged.
    Failed {
        /// Requested URL.
        url: String,
        /// Why the transfer failed.
        error: DownloadError,
    },
}

impl Outcome {
    /// Requested URL, `None` for dropped input.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Dropped => None,
            Self::SkippedByUrl { url, .. }
            | Self::SkippedByFilename { url, .. }
            | Self::Succeeded { url, .. }
            | Self::Failed { url, .. } => Some(url),
        }
    }

    /// Returns true for either skip state.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            Self::SkippedByUrl { .. } | Self::SkippedByFilename { .. }
        )
    }

    /// Returns true when the transfer was aborted by an interrupt.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        matches!(self, Self::Failed { error, .. } if error.kind() == FailureKind::Interrupted)
    }
}

/// Progress notifications emitted by [`Orchestrator::run`].
#[derive(Debug)]
pub enum Event<'a> {
    /// A transfer is starting.
    Downloading(&'a FetchJob),
    /// A URL reached its terminal state.
    Finished(&'a Outcome),
}

/// Counts for a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// URLs downloaded and recorded.
    pub succeeded: usize,
    /// URLs skipped by history.
    pub skipped: usize,
    /// URLs whose transfer failed.
    pub failed: usize,
    /// Successful downloads whose history save failed.
    pub persist_warnings: usize,
    /// The batch stopped early because of an interrupt.
    pub interrupted: bool,
}

impl BatchSummary {
    fn record(&mut self, outcome: &Outcome) {
        if outcome.is_skipped() {
            self.skipped += 1;
            return;
        }
        match outcome {
            Outcome::Succeeded { persist_error, .. } => {
                self.succeeded += 1;
                if persist_error.is_some() {
                    self.persist_warnings += 1;
                }
            }
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Dropped | Outcome::SkippedByUrl { .. } | Outcome::SkippedByFilename { .. } => {}
        }
    }

    /// Number of URLs that reached a terminal state other than dropped.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

/// Drives downloads for a run and owns the history for its duration.
pub struct Orchestrator<'a, P: ProgressSink = NoProgress> {
    client: &'a HttpClient,
    store: HistoryStore,
    output_dir: PathBuf,
    force: bool,
    progress: P,
    interrupt: Interrupt,
}

impl<'a> Orchestrator<'a, NoProgress> {
    /// Creates an orchestrator without progress output.
    #[must_use]
    pub fn new(client: &'a HttpClient, store: HistoryStore, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            store,
            output_dir: output_dir.into(),
            force: false,
            progress: NoProgress,
            interrupt: Interrupt::new(),
        }
    }
}

impl<'a, P: ProgressSink> Orchestrator<'a, P> {
    /// Replaces the progress sink.
    #[must_use]
    pub fn with_progress<Q: ProgressSink>(self, progress: Q) -> Orchestrator<'a, Q> {
        Orchestrator {
            client: self.client,
            store: self.store,
            output_dir: self.output_dir,
            force: self.force,
            progress,
            interrupt: self.interrupt,
        }
    }

    /// Bypasses both history checks when set.
    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Uses `interrupt` to abort in-flight transfers.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// The history store.
    #[must_use]
    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// The progress sink.
    #[must_use]
    pub fn progress(&self) -> &P {
        &self.progress
    }

    /// Decides what to do with `raw` without touching the network.
    #[must_use]
    pub fn decide(&self, raw: &str) -> Decision {
        let url = raw.trim();
        if url.is_empty() {
            return Decision::Drop;
        }

        let history = self.store.history();
        if !self.force
            && let Some(record) = history.lookup_url(url)
        {
            info!(url, local_path = %record.local_path, "skipping, URL already downloaded");
            return Decision::SkipByUrl {
                url: url.to_string(),
                local_path: record.local_path.clone(),
            };
        }

        let filename = filename_from_url(url);
        debug!(
            url,
            filename = %filename,
            known_files = history.downloaded_files().len(),
            "resolved filename"
        );
        if !self.force && history.lookup_filename(&filename).is_some() {
            info!(url, filename = %filename, "skipping, file already downloaded");
            return Decision::SkipByFilename {
                url: url.to_string(),
                filename,
            };
        }

        Decision::Fetch(FetchJob {
            url: url.to_string(),
            filename,
        })
    }

    /// Downloads `job` and records it on success.
    pub async fn fetch(&mut self, job: FetchJob) -> Outcome {
        let transfer = self
            .client
            .download_to_dir(
                &job.url,
                &self.output_dir,
                &mut self.progress,
                &self.interrupt,
            )
            .await;

        let transfer = match transfer {
            Ok(transfer) => transfer,
            Err(error) => {
                warn!(url = %job.url, kind = %error.kind(), error = %error, "download failed");
                return Outcome::Failed {
                    url: job.url,
                    error,
                };
            }
        };

        let record = DownloadRecord {
            url: job.url.clone(),
            local_path: transfer.path.display().to_string(),
            downloaded_at: Utc::now(),
            size_bytes: transfer.bytes,
        };
        self.store.record_download(job.filename.clone(), record);

        let persist_error = match self.store.save() {
            Ok(()) => None,
            Err(error) => {
                warn!(
                    url = %job.url,
                    path = %self.store.path().display(),
                    error = %error,
                    "could not save history"
                );
                Some(error)
            }
        };

        Outcome::Succeeded {
            url: job.url,
            filename: job.filename,
            path: transfer.path,
            bytes: transfer.bytes,
            persist_error,
        }
    }

    /// Decides and, when needed, fetches a single URL.
    pub async fn process(&mut self, raw: &str) -> Outcome {
        let decision = self.decide(raw);
        self.settle(decision, &mut |_: Event<'_>| {}).await
    }

    /// Processes `urls` in order, reporting each step through `report`.
    ///
    /// Per-URL failures never stop the batch; an interrupt does.
    pub async fn run<I, F>(&mut self, urls: I, mut report: F) -> BatchSummary
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        F: FnMut(Event<'_>),
    {
        let mut summary = BatchSummary::default();

        for raw in urls {
            if self.interrupt.is_triggered() {
                summary.interrupted = true;
                break;
            }

            let decision = self.decide(raw.as_ref());
            let outcome = self.settle(decision, &mut report).await;
            summary.record(&outcome);
            report(Event::Finished(&outcome));

            if outcome.was_interrupted() {
                summary.interrupted = true;
                break;
            }
        }

        info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            interrupted = summary.interrupted,
            "batch finished"
        );
        summary
    }

    async fn settle<F>(&mut self, decision: Decision, report: &mut F) -> Outcome
    where
        F: FnMut(Event<'_>),
    {
        match decision {
            Decision::Drop => Outcome::Dropped,
            Decision::SkipByUrl { url, local_path } => Outcome::SkippedByUrl { url, local_path },
            Decision::SkipByFilename { url, filename } => {
                Outcome::SkippedByFilename { url, filename }
            }
            Decision::Fetch(job) => {
                report(Event::Downloading(&job));
                self.fetch(job).await
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::history::History;

    fn store_with(entries: &[(&str, &str)]) -> HistoryStore {
        let mut history = History::new();
        for (filename, url) in entries {
            history.record_download(
                *filename,
                DownloadRecord {
                    url: (*url).to_string(),
                    local_path: format!("downloads/{filename}"),
                    ..DownloadRecord::default()
                },
            );
        }
        HistoryStore::new("unused-history.json", history)
    }

    #[test]
    fn test_decide_drops_blank_input() {
        let client = HttpClient::new();
        let orchestrator = Orchestrator::new(&client, store_with(&[]), ".");
        assert_eq!(orchestrator.decide(""), Decision::Drop);
        assert_eq!(orchestrator.decide("   \t "), Decision::Drop);
    }

    #[test]
    fn test_decide_skips_known_url() {
        let client = HttpClient::new();
        let orchestrator =
            Orchestrator::new(&client, store_with(&[("a.zip", "https://x.test/a.zip")]), ".");

        assert_eq!(
            orchestrator.decide("  https://x.test/a.zip \n"),
            Decision::SkipByUrl {
                url: "https://x.test/a.zip".to_string(),
                local_path: "downloads/a.zip".to_string(),
            }
        );
    }

    #[test]
    fn test_decide_skips_known_filename_from_other_url() {
        let client = HttpClient::new();
        let orchestrator =
            Orchestrator::new(&client, store_with(&[("a.zip", "https://x.test/a.zip")]), ".");

        assert_eq!(
            orchestrator.decide("https://mirror.test/pub/a.zip"),
            Decision::SkipByFilename {
                url: "https://mirror.test/pub/a.zip".to_string(),
                filename: "a.zip".to_string(),
            }
        );
    }

    #[test]
    fn test_decide_does_not_normalize_urls() {
        let client = HttpClient::new();
        let orchestrator =
            Orchestrator::new(&client, store_with(&[("a.zip", "https://x.test/a.zip")]), ".");

        // Different query string, same filename: caught by the filename check only.
        assert!(matches!(
            orchestrator.decide("https://x.test/a.zip?v=2"),
            Decision::SkipByFilename { .. }
        ));
    }

    #[test]
    fn test_decide_fetches_unknown_url() {
        let client = HttpClient::new();
        let orchestrator = Orchestrator::new(&client, store_with(&[]), ".");

        assert_eq!(
            orchestrator.decide("https://x.test/b.zip"),
            Decision::Fetch(FetchJob {
                url: "https://x.test/b.zip".to_string(),
                filename: "b.zip".to_string(),
            })
        );
    }

    #[test]
    fn test_decide_force_bypasses_both_checks() {
        let client = HttpClient::new();
        let orchestrator =
            Orchestrator::new(&client, store_with(&[("a.zip", "https://x.test/a.zip")]), ".")
                .force(true);

        assert!(matches!(
            orchestrator.decide("https://x.test/a.zip"),
            Decision::Fetch(_)
        ));
        assert!(matches!(
            orchestrator.decide("https://mirror.test/a.zip"),
            Decision::Fetch(_)
        ));
    }

    #[test]
    fn test_batch_summary_counts_outcomes() {
        let mut summary = BatchSummary::default();
        summary.record(&Outcome::Dropped);
        summary.record(&Outcome::SkippedByUrl {
            url: "u".into(),
            local_path: "p".into(),
        });
        summary.record(&Outcome::SkippedByFilename {
            url: "v".into(),
            filename: "f".into(),
        });
        summary.record(&Outcome::Failed {
            url: "u".into(),
            error: DownloadError::http_status("u", 404),
        });
        summary.record(&Outcome::Succeeded {
            url: "u".into(),
            filename: "f".into(),
            path: PathBuf::from("f"),
            bytes: 1,
            persist_error: Some(HistoryError::Serialize(
                serde_json::from_str::<u8>("x").unwrap_err(),
            )),
        });

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.persist_warnings, 1);
        assert_eq!(summary.total(), 4);
        assert!(!summary.interrupted);
    }

    #[test]
    fn test_outcome_was_interrupted() {
        let interrupted = Outcome::Failed {
            url: "u".into(),
            error: DownloadError::interrupted("u"),
        };
        assert!(interrupted.was_interrupted());
        assert!(!Outcome::Dropped.was_interrupted());
        assert!(!interrupted.is_skipped());
        assert!(!Outcome::Dropped.is_skipped());
        assert_eq!(Outcome::Dropped.url(), None);
        assert_eq!(interrupted.url(), Some("u"));
    }
}
