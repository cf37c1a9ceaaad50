//! Crawl executor
//!
//! Pulls pages from a [`PageSource`] and streams them into a
//! [`JsonArrayWriter`]. The destination is created before the first request,
//! so an existing file fails the crawl without touching the network.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::crawler::config::{DEFAULT_REQUEST_TIMEOUT, MAX_RATE_LIMIT_ATTEMPTS};
use crate::crawler::progress::{CrawlObserver, NoopObserver, SharedObserver};
use crate::crawler::{CrawlError, CrawlJob};
use crate::fetcher::discord_config::DEFAULT_API_BASE;
use crate::fetcher::{DiscordHttpClient, MessageFetcher, MessagePager, PageSource};
use crate::output::{CrawlSummary, JsonArrayWriter};

/// Stream every page of `source` into `writer`, then close it.
///
/// Pages are written in arrival order. On any error the writer is dropped,
/// which still terminates the array on disk.
pub async fn serialize_pages<S>(
    source: &mut S,
    mut writer: JsonArrayWriter,
    observer: &dyn CrawlObserver,
) -> Result<CrawlSummary, CrawlError>
where
    S: PageSource + ?Sized,
{
    while let Some(page) = source.next_page().await? {
        writer.write_page(&page)?;
        observer.on_page_written(
            writer.pages_written(),
            page.len(),
            writer.summary().message_count,
        );
    }

    let summary = writer.finish()?;
    observer.on_finished(&summary);
    Ok(summary)
}

/// Create `path` exclusively and stream `source` into it
pub async fn serialize_to_path<S>(
    source: &mut S,
    path: impl AsRef<Path>,
    observer: &dyn CrawlObserver,
) -> Result<CrawlSummary, CrawlError>
where
    S: PageSource + ?Sized,
{
    let writer = JsonArrayWriter::create(path)?;
    serialize_pages(source, writer, observer).await
}

/// Crawl executor runs a [`CrawlJob`] end to end
pub struct CrawlExecutor {
    api_base: String,
    request_timeout: Duration,
    max_attempts: u32,
    observer: SharedObserver,
}

impl CrawlExecutor {
    /// Create an executor against the public API with default settings
    pub fn new() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_attempts: MAX_RATE_LIMIT_ATTEMPTS,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Point the executor at another API base (mock servers, proxies)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the rate-limit attempt budget per request
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Attach a diagnostics sink
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// API base URL in use
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Run the job against the Discord API.
    ///
    /// # Errors
    /// Any [`CrawlError`]; rate limiting is only an error once the attempt
    /// budget of a single request is spent.
    pub async fn execute(&self, job: &CrawlJob) -> Result<CrawlSummary, CrawlError> {
        let client = DiscordHttpClient::new(
            &job.credential.header_value(),
            self.api_base.clone(),
            self.request_timeout,
        )?
        .with_max_attempts(self.max_attempts)
        .with_observer(self.observer.clone());

        self.execute_with(job, client).await
    }

    /// Run the job with a caller-supplied fetcher
    pub async fn execute_with<F: MessageFetcher>(
        &self,
        job: &CrawlJob,
        fetcher: F,
    ) -> Result<CrawlSummary, CrawlError> {
        info!(
            "Starting crawl: channel={} ids={}..={} path={}",
            job.channel_id,
            job.range.oldest(),
            job.range.newest(),
            job.output_path.display()
        );

        let writer = JsonArrayWriter::create(&job.output_path)?;
        let mut pager = MessagePager::new(fetcher, job.channel_id, &job.range);

        let summary = serialize_pages(&mut pager, writer, self.observer.as_ref()).await?;

        debug!("Crawl finished after {} requests", pager.pages_fetched());
        info!(
            "Crawled {} messages from channel {}",
            summary.message_count, job.channel_id
        );
        Ok(summary)
    }
}

impl Default for CrawlExecutor {
    fn default() -> Self {
        Self::new()
    }
}
