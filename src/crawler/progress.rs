//! Diagnostics sink for a running crawl.
//!
//! The pipeline reports what it is doing through a [`CrawlObserver`] handed
//! in by the caller, so the library never depends on a global progress bar or
//! terminal. `tracing` output is emitted independently of the observer.

use crate::fetcher::retry_formatter::RetryContext;
use crate::output::CrawlSummary;
use crate::MessageId;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to an observer.
pub type SharedObserver = Arc<dyn CrawlObserver>;

/// Receives crawl events. Every method defaults to doing nothing.
pub trait CrawlObserver: Send + Sync {
    /// A page request is about to be sent
    fn on_request(&self, _channel_id: u64, _before: MessageId) {}

    /// A request was rate limited; `ctx.delay` is about to be slept
    fn on_rate_limited(&self, _ctx: &RetryContext) {}

    /// A page (possibly empty after filtering) was written to the output
    fn on_page_written(&self, _page_number: u64, _page_len: usize, _total_messages: u64) {}

    /// The output was closed successfully
    fn on_finished(&self, _summary: &CrawlSummary) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CrawlObserver for NoopObserver {}

/// Terminal spinner showing pages and messages written.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    /// Create a spinner drawing to stderr
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} pages {msg}")
                .expect("hardcoded template is valid"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Wrap an existing bar (hidden bars are useful in tests)
    pub fn with_bar(bar: ProgressBar) -> Self {
        Self { bar }
    }

    /// Number of pages reported so far
    pub fn pages(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlObserver for ProgressObserver {
    fn on_rate_limited(&self, ctx: &RetryContext) {
        self.bar.set_message(format!(
            "rate limited, waiting {} ms (attempt {}/{})",
            ctx.delay.as_millis(),
            ctx.attempt,
            ctx.max_attempts
        ));
    }

    fn on_page_written(&self, page_number: u64, _page_len: usize, total_messages: u64) {
        self.bar.set_position(page_number);
        self.bar.set_message(format!("{total_messages} messages"));
    }

    fn on_finished(&self, summary: &CrawlSummary) {
        self.bar
            .finish_with_message(format!("{} messages", summary.message_count));
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        // A failed crawl never reaches on_finished; stop the ticker here.
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
