//! Crawl output: the streamed JSON array and its summary

use crate::MessageId;
use serde::Serialize;
use std::path::PathBuf;

pub mod json;

pub use json::JsonArrayWriter;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Destination already exists; nothing is overwritten
    #[error("output file already exists: {}", path.display())]
    Conflict {
        /// Destination path
        path: PathBuf,
    },

    /// IO error while creating or writing the destination
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Destination path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A message could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// ID and timestamp of a boundary message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageBound {
    /// Message ID
    pub id: MessageId,
    /// Timestamp exactly as the service sent it (empty when absent)
    pub timestamp: String,
}

/// Statistics accumulated while streaming.
///
/// `newest` comes from the first message written and `oldest` from the last
/// one. Both are `None` when nothing matched the crawl range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Messages written to the array
    pub message_count: u64,
    /// Oldest message written
    pub oldest: Option<MessageBound>,
    /// Newest message written
    pub newest: Option<MessageBound>,
}

impl CrawlSummary {
    /// Whether no message was written
    pub fn is_empty(&self) -> bool {
        self.message_count == 0
    }

    /// `(oldest, newest)` IDs
    pub fn id_range(&self) -> Option<(MessageId, MessageId)> {
        Some((self.oldest.as_ref()?.id, self.newest.as_ref()?.id))
    }

    /// `(oldest, newest)` timestamps
    pub fn timestamp_range(&self) -> Option<(&str, &str)> {
        Some((
            self.oldest.as_ref()?.timestamp.as_str(),
            self.newest.as_ref()?.timestamp.as_str(),
        ))
    }
}
