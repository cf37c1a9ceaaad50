//! CLI error types and conversions

use crate::crawler::CrawlError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Crawl error
    #[error("crawl error: {0}")]
    CrawlError(#[from] CrawlError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Reading the token interactively failed
    #[error("failed to read token: {0}")]
    PromptError(String),
}
