//! Discord HTTP client
//!
//! Sends one logical request at a time and classifies the response:
//! - hard statuses (400/401/403/404/405/5xx) fail immediately
//! - 429 sleeps for the server-supplied `retry_after` and resends the same
//!   request, up to a fixed attempt budget
//! - anything else is returned to the caller as-is

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, Response};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::crawler::config::{calculate_backoff, MAX_RATE_LIMIT_ATTEMPTS};
use crate::crawler::progress::{NoopObserver, SharedObserver};
use crate::fetcher::discord_config::{
    channel_messages_path, join_url, AUTHORIZATION_HEADER, BEFORE_PARAM, LIMIT_PARAM,
};
use crate::fetcher::retry_formatter::{DelaySource, RetryContext};
use crate::fetcher::status::StatusClass;
use crate::fetcher::{FetcherError, FetcherResult, MessageFetcher};
use crate::{MessageId, Page};

/// Body of a 429 response. Only `retry_after` (milliseconds) is used.
#[derive(Debug, Default, Deserialize)]
struct RateLimitBody {
    retry_after: Option<f64>,
}

/// Rate-aware client for the Discord REST API
pub struct DiscordHttpClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
    observer: SharedObserver,
}

impl DiscordHttpClient {
    /// Create a client that attaches `authorization` to every request.
    ///
    /// # Arguments
    /// * `authorization` - Header value: a raw token or `"<scheme> <token>"`
    /// * `base_url` - API base, e.g.
    ///   [`DEFAULT_API_BASE`](crate::fetcher::discord_config::DEFAULT_API_BASE)
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    /// Fails when the credential is not a valid header value or the TLS
    /// backend cannot be initialised.
    pub fn new(
        authorization: &str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> FetcherResult<Self> {
        let mut value = HeaderValue::from_str(authorization).map_err(|_| {
            FetcherError::InvalidCredential(
                "token contains characters not allowed in an HTTP header".to_string(),
            )
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION_HEADER, value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| FetcherError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Wrap a preconfigured reqwest client (headers are not added)
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            max_attempts: MAX_RATE_LIMIT_ATTEMPTS,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Override the rate-limit attempt budget (at least one attempt is made)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Report rate-limit hits and requests to `observer`
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attempt budget per logical request
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Send one logical request.
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - Path relative to the API base (e.g. "/channels/1/messages")
    /// * `params` - Query parameters as key-value pairs
    ///
    /// # Errors
    /// `Protocol` for hard statuses, `RetryExhausted` when every attempt was
    /// rate limited, `Network` for transport failures.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> FetcherResult<Response> {
        let url = join_url(&self.base_url, path);
        let endpoint = format!("{method} {path}");

        for attempt in 1..=self.max_attempts {
            debug!(
                "Sending {} with {} params (attempt {}/{})",
                endpoint,
                params.len(),
                attempt,
                self.max_attempts
            );

            let response = self
                .client
                .request(method.clone(), &url)
                .query(params)
                .send()
                .await?;

            match StatusClass::classify(response.status()) {
                StatusClass::Pass => {
                    debug!("{} answered {}", endpoint, response.status());
                    return Ok(response);
                }
                StatusClass::Fatal { code, explanation } => {
                    return Err(FetcherError::Protocol {
                        status: code,
                        explanation,
                    });
                }
                StatusClass::RateLimited => {
                    let (delay, source) = rate_limit_delay(response, attempt - 1).await;
                    let ctx =
                        RetryContext::new(attempt, self.max_attempts, delay, source, &endpoint);

                    if !ctx.has_remaining() {
                        error!("{}", ctx.format_failure());
                        break;
                    }

                    warn!("{}", ctx.format_retry());
                    self.observer.on_rate_limited(&ctx);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(FetcherError::RetryExhausted {
            attempts: self.max_attempts,
            endpoint,
        })
    }
}

#[async_trait]
impl MessageFetcher for DiscordHttpClient {
    async fn fetch_messages(
        &self,
        channel_id: u64,
        before: MessageId,
        limit: usize,
    ) -> FetcherResult<Page> {
        self.observer.on_request(channel_id, before);

        let path = channel_messages_path(channel_id);
        let params = [
            (BEFORE_PARAM, before.to_string()),
            (LIMIT_PARAM, limit.to_string()),
        ];

        let response = self.send(Method::GET, &path, &params).await?;
        let status = response.status();
        let body = response.bytes().await?;

        serde_json::from_slice::<Page>(&body).map_err(|e| {
            FetcherError::Parse(format!(
                "expected a JSON array of messages from {path} (HTTP {status}): {e}"
            ))
        })
    }
}

/// Consume a 429 response and decide how long to wait.
async fn rate_limit_delay(response: Response, retry_count: u32) -> (Duration, DelaySource) {
    let header = response.headers().get(RETRY_AFTER).cloned();
    let body = response.json::<RateLimitBody>().await.ok();
    resolve_delay(header.as_ref(), body, retry_count)
}

/// Body `retry_after` (ms) wins over the `Retry-After` header (s); the
/// exponential backoff is the last resort.
fn resolve_delay(
    header: Option<&HeaderValue>,
    body: Option<RateLimitBody>,
    retry_count: u32,
) -> (Duration, DelaySource) {
    if let Some(delay) = body
        .and_then(|b| b.retry_after)
        .and_then(|ms| duration_from_secs(ms / 1000.0))
    {
        return (delay, DelaySource::ResponseBody);
    }

    if let Some(delay) = header
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .and_then(duration_from_secs)
    {
        return (delay, DelaySource::ResponseHeader);
    }

    (calculate_backoff(retry_count), DelaySource::Backoff)
}

fn duration_from_secs(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}
