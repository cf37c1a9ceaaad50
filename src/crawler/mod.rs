//! Crawl orchestration
//!
//! Connects the [`MessagePager`](crate::fetcher::MessagePager) to the
//! [`JsonArrayWriter`](crate::output::JsonArrayWriter) and reports progress
//! through an injected [`CrawlObserver`](progress::CrawlObserver).
//!
//! # Overview
//!
//! 1. **Job Creation**: describe what to crawl with [`job::CrawlJob`]
//! 2. **Execution**: run it with [`executor::CrawlExecutor`]
//! 3. **Diagnostics**: observe pages and rate limits via [`progress`]
//!
//! # Error Handling
//!
//! All operations return `Result<T, CrawlError>`. Rate limiting is absorbed
//! inside the HTTP client; everything else propagates unchanged:
//! - protocol errors (hard HTTP statuses) and exhausted retries
//! - output conflicts (destination exists), reported before any request
//! - IO errors while streaming; the file is still bracket-terminated

pub mod config;
pub mod executor;
pub mod job;
pub mod progress;

pub use executor::{serialize_pages, serialize_to_path, CrawlExecutor};
pub use job::{CrawlJob, CrawlRange, Credential, TokenType};
pub use progress::{CrawlObserver, NoopObserver, ProgressObserver, SharedObserver};

use crate::fetcher::FetcherError;
use crate::output::OutputError;

/// Crawl errors
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// Fetching a page failed
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Writing the output failed
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Crawl bounds cannot be turned into a cursor
    #[error("invalid crawl range: {0}")]
    InvalidRange(String),
}

impl CrawlError {
    /// HTTP status behind a protocol error, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CrawlError::Fetcher(FetcherError::Protocol { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
