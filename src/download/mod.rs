//! HTTP transfer engine for streaming files to disk.
//!
//! # Features
//!
//! - Streaming downloads (memory bounded by the chunk size)
//! - Filenames from the URL path, with a SHA-256 fingerprint fallback
//! - Fingerprint suffix instead of overwriting files already on disk
//! - Throttled progress reporting through an injectable [`ProgressSink`]
//! - Partial files removed on I/O errors and on interrupt
//!
//! # Example
//!
//! ```no_run
//! use fetchlog::download::{HttpClient, Interrupt, NoProgress};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let result = client
//!     .download_to_dir(
//!         "https://example.com/file.zip",
//!         Path::new("./downloads"),
//!         &mut NoProgress,
//!         &Interrupt::new(),
//!     )
//!     .await?;
//! println!("Downloaded {} bytes to {}", result.bytes, result.path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
pub mod filename;
mod interrupt;
pub mod progress;

pub use client::{HttpClient, TransferResult};
pub use error::{BodyError, DownloadError, FailureKind};
pub use filename::{disambiguate, filename_from_url, url_fingerprint};
pub use interrupt::Interrupt;
pub use progress::{BarProgress, NoProgress, ProgressSink, RecordingProgress, Throttle};
