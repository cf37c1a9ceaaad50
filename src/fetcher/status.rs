//! HTTP status classification for Discord API responses.
//!
//! A fixed table decides, per status code, whether a response is returned to
//! the caller, fails the crawl immediately, or is retried after the
//! server-directed delay.

use reqwest::StatusCode;

const BAD_REQUEST: &str =
    "The request was improperly formatted, or the server couldn't understand it.";
const UNAUTHORIZED: &str = "The Authorization header was missing or invalid.";
const FORBIDDEN: &str =
    "The Authorization token you passed did not have permission to the resource.";
const NOT_FOUND: &str = "The resource at the location specified doesn't exist.";
const METHOD_NOT_ALLOWED: &str = "The HTTP method used is not valid for the location specified.";
const BAD_GATEWAY: &str =
    "There was not a gateway available to process your request. Wait a bit and retry.";
const SERVER_ERROR: &str = "The server had an error processing your request.";

/// What to do with a response, decided by its status code alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Hand the response to the caller
    Pass,
    /// HTTP 429: sleep for `retry_after` and send the same request again
    RateLimited,
    /// Fail immediately with the canned explanation
    Fatal {
        /// HTTP status code
        code: u16,
        /// Human-readable explanation of the code
        explanation: &'static str,
    },
}

impl StatusClass {
    /// Classify a status code
    pub fn classify(status: StatusCode) -> Self {
        let code = status.as_u16();
        let explanation = match code {
            400 => BAD_REQUEST,
            401 => UNAUTHORIZED,
            403 => FORBIDDEN,
            404 => NOT_FOUND,
            405 => METHOD_NOT_ALLOWED,
            429 => return Self::RateLimited,
            502 => BAD_GATEWAY,
            _ if status.is_server_error() => SERVER_ERROR,
            _ => return Self::Pass,
        };
        Self::Fatal { code, explanation }
    }
}
