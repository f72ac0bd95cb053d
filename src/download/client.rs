//! HTTP client wrapper for streaming downloads to disk.
//!
//! [`HttpClient::download_to_dir`] issues the GET, picks the output path,
//! streams the body to disk while feeding a [`ProgressSink`], and removes
//! the partial file if the copy fails or is interrupted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, USER_AGENT};
use super::error::{BodyError, DownloadError};
use super::filename::{disambiguate, filename_from_url};
use super::interrupt::Interrupt;
use super::progress::ProgressSink;

/// HTTP client for downloading files with streaming support.
///
/// Create once and reuse for every URL of a run to benefit from connection
/// pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// A completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    /// Final output path, after collision handling.
    pub path: PathBuf,
    /// Bytes written to `path`.
    pub bytes: u64,
    /// Size announced by the server, when it sent one.
    pub content_length: Option<u64>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with the default timeouts (30s connect, 5min read idle).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client with explicit timeout values in seconds.
    ///
    /// The read timeout bounds the silence between two reads, not the whole
    /// transfer, so a slow but steady download never times out.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Downloads `url` into `output_dir`.
    ///
    /// The output name is [`filename_from_url`]; if that file already exists
    /// the URL fingerprint is inserted before the extension instead of
    /// overwriting it.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`], [`DownloadError::Network`],
    ///   [`DownloadError::Timeout`] when the request cannot be made
    /// - [`DownloadError::HttpStatus`] for a non-2xx response
    /// - [`DownloadError::Io`] / [`DownloadError::Body`] when the streamed copy
    ///   fails; the partial file is removed
    /// - [`DownloadError::Interrupted`] when `interrupt` fires mid-transfer
    #[instrument(skip(self, progress, interrupt), fields(url = %url))]
    pub async fn download_to_dir(
        &self,
        url: &str,
        output_dir: &Path,
        progress: &mut dyn ProgressSink,
        interrupt: &Interrupt,
    ) -> Result<TransferResult, DownloadError> {
        debug!("starting download");

        let response = tokio::select! {
            biased;
            () = interrupt.triggered() => return Err(DownloadError::interrupted(url)),
            response = self.send_get(url) => response?,
        };

        let filename = filename_from_url(url);
        let path = disambiguate(output_dir, &filename, url);
        let content_length = declared_content_length(&response);
        debug!(filename = %filename, path = %path.display(), ?content_length, "resolved output path");

        let label = path
            .file_name()
            .map_or_else(|| filename.clone(), |name| name.to_string_lossy().into_owned());
        progress.begin(&label, content_length);
        let copied = write_stream(response.bytes_stream(), &path, url, progress, interrupt).await;
        progress.finish(copied.is_ok());
        let bytes = copied?;

        info!(path = %path.display(), bytes, "download complete");

        Ok(TransferResult {
            path,
            bytes,
            content_length,
        })
    }

    async fn send_get(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "server returned error status");
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }
}

fn declared_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

/// Creates `path` and streams `stream` into it, removing the file on any failure.
pub(crate) async fn write_stream<S, B, E>(
    stream: S,
    path: &Path,
    url: &str,
    progress: &mut dyn ProgressSink,
    interrupt: &Interrupt,
) -> Result<u64, DownloadError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<BodyError>,
{
    let file = File::create(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    let copied = copy_stream(file, stream, path, url, progress, interrupt).await;

    if copied.is_err() {
        debug!(path = %path.display(), "cleaning up partial file after error");
        if let Err(error) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %error, "failed to remove partial file");
        }
    }

    copied
}

async fn copy_stream<S, B, E>(
    file: File,
    stream: S,
    path: &Path,
    url: &str,
    progress: &mut dyn ProgressSink,
    interrupt: &Interrupt,
) -> Result<u64, DownloadError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<BodyError>,
{
    let mut writer = BufWriter::new(file);
    let mut stream = std::pin::pin!(stream);
    let mut interrupted = std::pin::pin!(interrupt.triggered());
    let mut bytes_written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = &mut interrupted => return Err(DownloadError::interrupted(url)),
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };

        let chunk = chunk_result.map_err(|e| DownloadError::body(url, path, e.into()))?;
        let chunk = chunk.as_ref();

        writer
            .write_all(chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        let len = chunk.len() as u64;
        bytes_written += len;
        progress.advance(len);
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    Ok(bytes_written)
}
