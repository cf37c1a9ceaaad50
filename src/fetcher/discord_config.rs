//! Discord API configuration
//!
//! Endpoint layout and request constants for the v6 REST API.

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://discordapp.com/api/v6";

/// Maximum messages the API returns per request, used as the page size
pub const MESSAGES_PER_REQUEST: usize = 100;

/// Header carrying the credential on every request
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Query parameter holding the backward cursor
pub const BEFORE_PARAM: &str = "before";

/// Query parameter holding the page size
pub const LIMIT_PARAM: &str = "limit";

/// Path of the channel messages endpoint, relative to the API base
pub fn channel_messages_path(channel_id: u64) -> String {
    format!("/channels/{channel_id}/messages")
}

/// Join an API base and a relative path without doubling the slash
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
