//! Persisted download history.
//!
//! The history file is a single indented JSON object:
//!
//! ```json
//! {
//!   "downloads": {
//!     "https://x.test/a.zip": {
//!       "url": "https://x.test/a.zip",
//!       "filename": "downloads/a.zip",
//!       "downloaded": "2024-05-01T10:00:00Z",
//!       "size": 1024
//!     }
//!   },
//!   "downloaded_files": {
//!     "a.zip": "https://x.test/a.zip"
//!   }
//! }
//! ```
//!
//! `downloads` is keyed by the exact requested URL; `downloaded_files` maps
//! the resolved base filename back to its URL and is only used for
//! pre-download collision checks. Files written before `downloaded_files`
//! existed are upgraded on load by [`backfill`].

mod error;

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::download::filename_from_url;

pub use error::HistoryError;

/// Default history file name, relative to the working directory.
pub const DEFAULT_HISTORY_FILE: &str = ".download_history.json";

/// Metadata for one successful download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadRecord {
    /// The URL exactly as requested.
    pub url: String,
    /// Path the file was written to.
    #[serde(rename = "filename")]
    pub local_path: String,
    /// When the download finished.
    #[serde(rename = "downloaded")]
    pub downloaded_at: DateTime<Utc>,
    /// Bytes written.
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

/// In-memory download history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(rename = "downloads", default, deserialize_with = "null_as_empty")]
    by_url: BTreeMap<String, DownloadRecord>,
    #[serde(
        rename = "downloaded_files",
        default,
        deserialize_with = "null_as_empty"
    )]
    by_filename: BTreeMap<String, String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no download has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    /// Record for an exact URL.
    #[must_use]
    pub fn lookup_url(&self, url: &str) -> Option<&DownloadRecord> {
        self.by_url.get(url)
    }

    /// URL that produced `filename`, if any.
    #[must_use]
    pub fn lookup_filename(&self, filename: &str) -> Option<&str> {
        self.by_filename.get(filename).map(String::as_str)
    }

    /// All records keyed by URL.
    #[must_use]
    pub fn downloads(&self) -> &BTreeMap<String, DownloadRecord> {
        &self.by_url
    }

    /// Filename to URL reverse lookup.
    #[must_use]
    pub fn downloaded_files(&self) -> &BTreeMap<String, String> {
        &self.by_filename
    }

    /// Stores `record` under its URL and maps `filename` to that URL.
    ///
    /// An existing record for the same URL is replaced.
    pub fn record_download(&mut self, filename: impl Into<String>, record: DownloadRecord) {
        self.by_filename.insert(filename.into(), record.url.clone());
        self.by_url.insert(record.url.clone(), record);
    }

    /// Inserts a record without touching the filename lookup.
    ///
    /// Only useful to build legacy-shaped histories.
    pub fn insert_record(&mut self, record: DownloadRecord) {
        self.by_url.insert(record.url.clone(), record);
    }
}

/// Rebuilds `downloaded_files` from `downloads` for legacy data.
///
/// Runs only when the filename lookup is empty and downloads exist; the
/// flag reports whether anything changed (and so whether a save is due).
#[must_use]
pub fn backfill(mut history: History) -> (History, bool) {
    if !history.by_filename.is_empty() || history.by_url.is_empty() {
        return (history, false);
    }

    for url in history.by_url.keys() {
        history
            .by_filename
            .insert(filename_from_url(url), url.clone());
    }
    (history, true)
}

/// Loads history from `path`.
///
/// A missing file is a first run and yields an empty history. The flag is
/// true when legacy data was migrated and should be saved back.
///
/// # Errors
///
/// [`HistoryError::Read`] when the file exists but cannot be read, and
/// [`HistoryError::Corrupt`] when it cannot be parsed.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<(History, bool), HistoryError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!("no history file yet, starting empty");
            return Ok((History::new(), false));
        }
        Err(source) => {
            return Err(HistoryError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let history: History =
        serde_json::from_slice(&data).map_err(|source| HistoryError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;

    let (history, migrated) = backfill(history);
    if migrated {
        info!(
            entries = history.by_filename.len(),
            "rebuilt filename index from legacy history"
        );
    }
    debug!(
        downloads = history.by_url.len(),
        files = history.by_filename.len(),
        "history loaded"
    );
    Ok((history, migrated))
}

/// Writes `history` to `path` as indented JSON.
///
/// The data goes to a temporary file in the same directory which is then
/// renamed over `path`, so readers never see a half-written file.
///
/// # Errors
///
/// [`HistoryError::Write`] when the temporary file cannot be written or renamed.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn save(path: &Path, history: &History) -> Result<(), HistoryError> {
    let data = serde_json::to_vec_pretty(history).map_err(HistoryError::Serialize)?;
    let write_error = |source: io::Error| HistoryError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
    tmp.write_all(&data).map_err(write_error)?;
    tmp.as_file().sync_all().map_err(write_error)?;
    set_readable_permissions(tmp.path()).map_err(write_error)?;
    tmp.persist(path).map_err(|e| write_error(e.error))?;

    debug!(bytes = data.len(), "history saved");
    Ok(())
}

#[cfg(unix)]
fn set_readable_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_readable_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// History bound to the file it is persisted in.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    history: History,
}

impl HistoryStore {
    /// Loads the store from `path`; see [`load`].
    ///
    /// # Errors
    ///
    /// Propagates [`load`] errors.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, bool), HistoryError> {
        let path = path.into();
        let (history, needs_save) = load(&path)?;
        Ok((Self { path, history }, needs_save))
    }

    /// Wraps an already loaded history.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, history: History) -> Self {
        Self {
            path: path.into(),
            history,
        }
    }

    /// History file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Records a download in memory. Call [`HistoryStore::save`] to persist it.
    pub fn record_download(&mut self, filename: impl Into<String>, record: DownloadRecord) {
        self.history.record_download(filename, record);
    }

    /// Persists the in-memory history; see [`save`].
    ///
    /// # Errors
    ///
    /// Propagates [`save`] errors. The in-memory history stays authoritative.
    pub fn save(&self) -> Result<(), HistoryError> {
        save(&self.path, &self.history)
    }

    /// Consumes the store, returning the history.
    #[must_use]
    pub fn into_history(self) -> History {
        self.history
    }
}
