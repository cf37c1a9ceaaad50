//! Data fetching from the Discord REST API

use crate::{MessageId, Page};
use async_trait::async_trait;

pub mod discord_config;
pub mod discord_http;
pub mod pagination;
pub mod retry_formatter;
pub mod status;

pub use discord_http::DiscordHttpClient;
pub use pagination::MessagePager;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Hard HTTP status from the table in [`status`]; never retried
    #[error("[HTTP code: {status}] {explanation}")]
    Protocol {
        /// HTTP status code
        status: u16,
        /// Canned explanation for the status
        explanation: &'static str,
    },

    /// Every attempt in the rate-limit budget came back 429
    #[error("rate limited on all {attempts} attempts for {endpoint}")]
    RetryExhausted {
        /// Attempts made, equal to the budget
        attempts: u32,
        /// Endpoint path that was being requested
        endpoint: String,
    },

    /// Credential cannot be sent as a header value
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Transport failure (DNS, connect, timeout, body read)
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    Parse(String),

    /// Response decoded but violates the paging contract
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for FetcherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetcherError::Parse(err.to_string())
        } else {
            FetcherError::Network(err.to_string())
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Source of raw (unfiltered) message pages for one channel.
///
/// Implemented by [`DiscordHttpClient`]; tests substitute scripted pages.
#[async_trait]
pub trait MessageFetcher: Send + Sync {
    /// Fetch up to `limit` messages strictly older than `before`, newest first
    async fn fetch_messages(
        &self,
        channel_id: u64,
        before: MessageId,
        limit: usize,
    ) -> FetcherResult<Page>;
}

/// Pull-based sequence of filtered pages.
///
/// `Ok(None)` marks the end; a source is not restartable.
#[async_trait]
pub trait PageSource: Send {
    /// Produce the next page, or `None` once exhausted
    async fn next_page(&mut self) -> FetcherResult<Option<Page>>;
}
