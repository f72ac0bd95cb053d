//! Progress reporting for streamed transfers.
//!
//! The transfer engine feeds a [`ProgressSink`] with byte counts as chunks
//! are written. Sinks are driven synchronously from the copy loop and must
//! not block.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::constants::PROGRESS_INTERVAL;

const BAR_TEMPLATE: &str = "[{bar:50}] {percent:>3}% {bytes} / {total_bytes}  {msg}";
const BYTES_TEMPLATE: &str = "{bytes} downloaded  {msg}";

/// Receives byte counts for one transfer at a time.
pub trait ProgressSink: Send {
    /// Called once before the first chunk. `total` is the expected size when known.
    fn begin(&mut self, label: &str, total: Option<u64>);

    /// Called after each chunk is written with the chunk's length.
    fn advance(&mut self, bytes: u64);

    /// Called once when the copy ends. `succeeded` is false when the copy
    /// failed or was interrupted.
    fn finish(&mut self, succeeded: bool);
}

impl<P: ProgressSink + ?Sized> ProgressSink for Box<P> {
    fn begin(&mut self, label: &str, total: Option<u64>) {
        (**self).begin(label, total);
    }

    fn advance(&mut self, bytes: u64) {
        (**self).advance(bytes);
    }

    fn finish(&mut self, succeeded: bool) {
        (**self).finish(succeeded);
    }
}

/// Sink that ignores all updates (non-interactive runs).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn begin(&mut self, _label: &str, _total: Option<u64>) {}
    fn advance(&mut self, _bytes: u64) {}
    fn finish(&mut self, _succeeded: bool) {}
}

/// Sink that records every call, for tests and diagnostics.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    /// Label passed to the latest `begin`.
    pub label: Option<String>,
    /// Expected total passed to the latest `begin`.
    pub total: Option<u64>,
    /// Every `advance` amount, in order.
    pub chunks: Vec<u64>,
    /// Number of transfers that completed.
    pub finished: usize,
    /// Number of transfers that failed or were interrupted.
    pub abandoned: usize,
}

impl RecordingProgress {
    /// Sum of all advanced bytes.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.chunks.iter().sum()
    }
}

impl ProgressSink for RecordingProgress {
    fn begin(&mut self, label: &str, total: Option<u64>) {
        self.label = Some(label.to_string());
        self.total = total;
    }

    fn advance(&mut self, bytes: u64) {
        self.chunks.push(bytes);
    }

    fn finish(&mut self, succeeded: bool) {
        if succeeded {
            self.finished += 1;
        } else {
            self.abandoned += 1;
        }
    }
}

/// Rate gate that opens at most once per interval.
///
/// The first check always passes so the first chunk is drawn immediately.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(PROGRESS_INTERVAL)
    }
}

impl Throttle {
    /// Creates a throttle with the given minimum gap between openings.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true and records `now` when the interval has elapsed.
    pub fn ready_at(&mut self, now: Instant) -> bool {
        let open = self
            .last
            .is_none_or(|last| now.saturating_duration_since(last) > self.interval);
        if open {
            self.last = Some(now);
        }
        open
    }

    /// [`Throttle::ready_at`] with the current instant.
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    /// Forgets the last opening so the next check passes.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Terminal progress bar on stderr.
///
/// Renders a percentage and proportional bar when the size is known,
/// otherwise only the cumulative byte count.
#[derive(Debug, Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
    throttle: Throttle,
    written: u64,
}

impl BarProgress {
    /// Creates an idle bar; drawing starts on `begin`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for BarProgress {
    fn begin(&mut self, label: &str, total: Option<u64>) {
        let (bar, template) = match total {
            Some(total) if total > 0 => (ProgressBar::new(total), BAR_TEMPLATE),
            _ => (ProgressBar::no_length(), BYTES_TEMPLATE),
        };
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_message(label.to_string());

        self.bar = Some(bar);
        self.written = 0;
        self.throttle.reset();
    }

    fn advance(&mut self, bytes: u64) {
        self.written = self.written.saturating_add(bytes);
        if let Some(bar) = &self.bar
            && self.throttle.ready()
        {
            bar.set_position(self.written);
        }
    }

    fn finish(&mut self, succeeded: bool) {
        if let Some(bar) = self.bar.take() {
            bar.set_position(self.written);
            if succeeded {
                bar.finish();
            } else {
                bar.abandon();
            }
        }
    }
}
