//! Filename resolution for downloads.
//!
//! A URL maps to a local filename by its last path segment. URLs without a
//! usable segment fall back to a short SHA-256 fingerprint of the URL string,
//! and the same fingerprint disambiguates names that already exist on disk.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use url::Url;

use super::constants::FINGERPRINT_BYTES;

/// Returns the hex fingerprint of `url`: the first eight bytes of its SHA-256.
#[must_use]
pub fn url_fingerprint(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

/// Derives a non-empty local filename from a URL.
///
/// Uses the decoded last path segment (trailing slashes are ignored, so
/// `https://host/dir/` yields `dir`). Unparseable URLs and URLs whose path
/// has no usable segment yield [`url_fingerprint`] instead.
#[must_use]
pub fn filename_from_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url_fingerprint(url);
    };

    let decoded = urlencoding::decode(parsed.path())
        .map_or_else(|_| parsed.path().to_string(), |path| path.into_owned());
    let last = decoded
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    if last.is_empty() || last == "." || last == ".." {
        return url_fingerprint(url);
    }

    sanitize_filename(last)
}

/// Picks the output path for `filename` inside `dir`.
///
/// When `dir/filename` already exists, the URL fingerprint is inserted
/// before the extension (`report.pdf` becomes `report_<fp>.pdf`), so the
/// disambiguated name is stable for a given URL.
#[must_use]
pub fn disambiguate(dir: &Path, filename: &str, url: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = split_extension(filename);
    dir.join(format!("{stem}_{}{ext}", url_fingerprint(url)))
}

/// Splits at the last dot; the extension keeps its leading dot.
fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(pos) => (&filename[..pos], &filename[pos..]),
        None => (filename, ""),
    }
}

/// Replaces characters that would escape the output directory or break terminals.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
