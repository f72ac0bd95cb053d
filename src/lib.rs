//! Fetchlog core library.
//!
//! Downloads files from URLs and keeps a persisted history so the same
//! resource is not fetched twice.
//!
//! # Architecture
//!
//! - [`download`] - filename resolution and the streaming HTTP transfer engine
//! - [`history`] - the persisted URL/filename history
//! - [`orchestrator`] - the skip-or-fetch decision flow for a batch of URLs
//! - [`config`], [`input`], [`output`] - run settings and CLI plumbing

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod history;
pub mod input;
pub mod orchestrator;
pub mod output;

// Re-export commonly used types
pub use config::RunConfig;
pub use download::{
    DownloadError, FailureKind, HttpClient, Interrupt, NoProgress, ProgressSink, TransferResult,
    filename_from_url, url_fingerprint,
};
pub use history::{DownloadRecord, History, HistoryError, HistoryStore, backfill};
pub use orchestrator::{BatchSummary, Decision, Event, FetchJob, Orchestrator, Outcome};
