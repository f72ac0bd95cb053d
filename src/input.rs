//! URL collection from positional arguments or stdin.

use std::io::{self, BufRead};

/// Shown before reading URLs interactively.
pub const STDIN_PROMPT: &str = "Paste URLs (one per line, empty line or Ctrl+D to finish):";

/// Reads trimmed URLs, one per line, until a blank line or end of input.
///
/// # Errors
///
/// Returns the underlying read error.
pub fn read_urls(reader: impl BufRead) -> io::Result<Vec<String>> {
    let mut urls = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        urls.push(trimmed.to_string());
    }
    Ok(urls)
}

/// Returns `args` when non-empty, otherwise the URLs read from `stdin`.
///
/// # Errors
///
/// Returns the underlying read error.
pub fn collect_urls(args: &[String], stdin: impl BufRead) -> io::Result<Vec<String>> {
    if args.is_empty() {
        read_urls(stdin)
    } else {
        Ok(args.to_vec())
    }
}
