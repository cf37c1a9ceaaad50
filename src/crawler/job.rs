//! Crawl job description

use crate::crawler::CrawlError;
use crate::MessageId;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Kind of Discord token, deciding the Authorization header format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TokenType {
    /// Bot token, sent as `Bot <token>`
    Bot,
    /// OAuth2 bearer token, sent as `Bearer <token>`
    Bearer,
    /// User token, sent raw
    #[default]
    User,
}

impl TokenType {
    /// Header scheme prefix, `None` for raw tokens
    pub fn scheme(&self) -> Option<&'static str> {
        match self {
            Self::Bot => Some("Bot"),
            Self::Bearer => Some("Bearer"),
            Self::User => None,
        }
    }
}

impl FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bot" => Ok(TokenType::Bot),
            "bearer" => Ok(TokenType::Bearer),
            "user" => Ok(TokenType::User),
            _ => Err(format!(
                "Invalid token type: {s}. Valid options: bot, bearer, user"
            )),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bot => "bot",
            Self::Bearer => "bearer",
            Self::User => "user",
        };
        f.write_str(name)
    }
}

/// Token plus its type. `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    token_type: TokenType,
}

impl Credential {
    /// Create a credential; surrounding whitespace and quotes are stripped
    pub fn new(token: impl AsRef<str>, token_type: TokenType) -> Self {
        Self {
            token: normalize_token(token.as_ref()),
            token_type,
        }
    }

    /// Whether the token is empty after normalisation
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }

    /// Value of the Authorization header
    pub fn header_value(&self) -> String {
        match self.token_type.scheme() {
            Some(scheme) => format!("{scheme} {}", self.token),
            None => self.token.clone(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Trim whitespace and surrounding quotes pasted along with a token
pub fn normalize_token(raw: &str) -> String {
    fn is_quote_char(c: char) -> bool {
        matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’')
    }

    raw.trim()
        .trim_matches(is_quote_char)
        .trim()
        .to_string()
}

/// Inclusive ID bounds of a crawl.
///
/// The bounds are not checked against each other; an inverted range simply
/// yields no messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrawlRange {
    oldest: MessageId,
    newest: MessageId,
}

impl CrawlRange {
    /// Create a range from the oldest and newest message IDs to keep.
    ///
    /// # Errors
    /// `InvalidRange` when `newest` is the largest possible ID, since the
    /// first cursor (`newest + 1`) would not be representable.
    pub fn new(
        oldest: impl Into<MessageId>,
        newest: impl Into<MessageId>,
    ) -> Result<Self, CrawlError> {
        let oldest = oldest.into();
        let newest = newest.into();
        if newest.get().checked_add(1).is_none() {
            return Err(CrawlError::InvalidRange(format!(
                "newest message id {newest} leaves no room for the before cursor"
            )));
        }
        Ok(Self { oldest, newest })
    }

    /// Oldest ID kept (inclusive)
    pub fn oldest(&self) -> MessageId {
        self.oldest
    }

    /// Newest ID kept (inclusive)
    pub fn newest(&self) -> MessageId {
        self.newest
    }

    /// Cursor of the first request: one past the newest bound
    pub fn initial_cursor(&self) -> MessageId {
        MessageId(self.newest.get().saturating_add(1))
    }

    /// Whether `id` passes the lower-bound filter
    pub fn keeps(&self, id: MessageId) -> bool {
        id >= self.oldest
    }
}

/// Everything needed to crawl one channel into one file
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// Authorization for the API
    pub credential: Credential,
    /// Channel to crawl
    pub channel_id: u64,
    /// ID bounds of the messages to keep
    pub range: CrawlRange,
    /// Destination; must not exist yet
    pub output_path: PathBuf,
}

impl CrawlJob {
    /// Create a new crawl job
    pub fn new(
        credential: Credential,
        channel_id: u64,
        range: CrawlRange,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            credential,
            channel_id,
            range,
            output_path: output_path.into(),
        }
    }
}
