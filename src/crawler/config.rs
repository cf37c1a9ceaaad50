//! Crawl configuration constants

use std::time::Duration;

/// Attempts per logical request while the server keeps answering 429.
/// The budget is scoped to one request and starts over for the next page.
pub const MAX_RATE_LIMIT_ATTEMPTS: u32 = 5;

/// Initial fallback delay in milliseconds, used only when a 429 carries
/// neither a `retry_after` body field nor a `Retry-After` header.
pub const INITIAL_BACKOFF_MS: u64 = 1000; // 1 second

/// Cap for the fallback delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 30000; // 30 seconds

/// Per-request timeout handed to the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Calculate the fallback exponential backoff for a 0-based retry count
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(retry_count));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}
