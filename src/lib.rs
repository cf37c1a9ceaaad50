//! # Discord Chat Exporter Library
//!
//! Crawls the message history of a Discord channel through the REST API and
//! streams it into a single JSON array on disk, one page at a time, without
//! holding the whole history in memory.
//!
//! ## Features
//!
//! - **Cursor Pagination**: walks a channel backwards with the `before` cursor
//! - **Rate Limit Handling**: absorbs HTTP 429 responses by sleeping for the
//!   server-directed delay and retrying (bounded per request)
//! - **Streaming Output**: writes a syntactically valid JSON array
//!   incrementally; the closing bracket is written on every exit path
//! - **Crawl Summary**: message count plus oldest/newest IDs and timestamps,
//!   tracked while writing
//!
//! ## Quick Start
//!
//! ```no_run
//! use discord_chat_exporter::crawler::{
//!     CrawlExecutor, CrawlJob, CrawlRange, Credential, TokenType,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let job = CrawlJob::new(
//!     Credential::new("my-token", TokenType::Bot),
//!     123456789012345678,
//!     CrawlRange::new(700000000000000000u64, 800000000000000000u64)?,
//!     "./channel.json",
//! );
//!
//! let summary = CrawlExecutor::new().execute(&job).await?;
//! println!("crawled {} messages", summary.message_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Rate-aware HTTP client and the cursor pager
//! - [`output`] - Incremental JSON array writer and the crawl summary
//! - [`crawler`] - Job description, diagnostics sink, and the pipeline that
//!   connects pages to the writer
//! - [`cli`] - Command line parsing for the binary

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// CLI command implementation
pub mod cli;

/// Crawl orchestration
pub mod crawler;

/// HTTP client and pagination
pub mod fetcher;

/// JSON output writer
pub mod output;

pub use crawler::{CrawlError, CrawlExecutor, CrawlJob, CrawlRange};
pub use output::CrawlSummary;

/// Discord message identifier (a snowflake).
///
/// Snowflakes grow with creation time, so numeric order is chronological
/// order. The API encodes them as decimal strings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Raw numeric value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(MessageId)
    }
}

impl From<u64> for MessageId {
    fn from(value: u64) -> Self {
        MessageId(value)
    }
}

/// A message object as returned by the API.
///
/// The record is opaque: only `id` and `timestamp` are ever read, everything
/// else is passed through to the output untouched and in the original key
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    /// Message ID, accepting both the string and the integer encoding.
    ///
    /// Returns `None` when the field is missing or not a non-negative integer.
    pub fn id(&self) -> Option<MessageId> {
        match self.0.get("id")? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64().map(MessageId),
            _ => None,
        }
    }

    /// Raw `id` field exactly as the service sent it
    pub fn raw_id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    /// ISO-8601 timestamp string, passed through unparsed
    pub fn timestamp(&self) -> Option<&str> {
        self.0.get("timestamp").and_then(Value::as_str)
    }
}

/// One batch of messages from a single request, newest first.
pub type Page = Vec<Message>;
