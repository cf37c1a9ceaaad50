//! Message formatting for rate-limit retries.
//!
//! Keeps the wording of retry warnings and the final exhaustion report in one
//! place so the HTTP client and its tests agree on it.

use std::time::Duration;

/// Where the wait before the next attempt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelaySource {
    /// `retry_after` field of the 429 JSON body (milliseconds)
    ResponseBody,
    /// `Retry-After` response header (seconds)
    ResponseHeader,
    /// Neither was present; exponential fallback
    Backoff,
}

impl DelaySource {
    /// Short label used in log lines
    pub fn description(&self) -> &'static str {
        match self {
            Self::ResponseBody => "server retry_after",
            Self::ResponseHeader => "Retry-After header",
            Self::Backoff => "fallback backoff",
        }
    }
}

/// Context for one rate-limit hit.
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Attempt that was rate limited (1-based)
    pub attempt: u32,
    /// Attempt budget for the request
    pub max_attempts: u32,
    /// Wait before the next attempt
    pub delay: Duration,
    /// Origin of `delay`
    pub source: DelaySource,
    /// Method and path of the request, e.g. `GET /channels/1/messages`
    pub endpoint: String,
}

impl RetryContext {
    /// Build a context for a rate-limited attempt
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        source: DelaySource,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            delay,
            source,
            endpoint: endpoint.into(),
        }
    }

    /// Whether another attempt is left after this one
    pub fn has_remaining(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Warning emitted before sleeping
    pub fn format_retry(&self) -> String {
        format!(
            "Rate limited (attempt {}/{}) - waiting {} ms ({}) before retrying {}",
            self.attempt,
            self.max_attempts,
            self.delay.as_millis(),
            self.source.description(),
            self.endpoint
        )
    }

    /// Report emitted when the budget is spent
    pub fn format_failure(&self) -> String {
        let lines = [
            format!(
                "[FAILED] Request still rate limited after {} attempts",
                self.max_attempts
            ),
            format!("  Endpoint: {}", self.endpoint),
            format!("  Last retry_after: {} ms", self.delay.as_millis()),
            "  Suggestions:".to_string(),
            "    - Wait for the rate limit bucket to reset before crawling again".to_string(),
            "    - Avoid running several crawls with the same token at once".to_string(),
        ];
        lines.join("\n")
    }
}
