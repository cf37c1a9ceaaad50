//! Crawl command implementation

use crate::crawler::{
    CrawlExecutor, CrawlJob, CrawlRange, Credential, NoopObserver, ProgressObserver,
    SharedObserver, TokenType,
};
use crate::fetcher::discord_config::DEFAULT_API_BASE;
use crate::output::CrawlSummary;
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::CliError;

/// Discord Chat Exporter CLI
#[derive(Parser)]
#[command(name = "discord-chat-exporter")]
#[command(about = "Crawl a Discord channel's message history into a JSON file", long_about = None)]
#[command(version)]
pub struct Cli {
    /// A Discord bot/user token (prompted with hidden input when omitted)
    #[arg(long)]
    pub token: Option<String>,

    /// A type of Discord token: bot, bearer, or user
    #[arg(long, default_value = "user")]
    pub token_type: TokenType,

    /// A channel ID to crawl
    #[arg(long)]
    pub channel_id: u64,

    /// A newest message ID to crawl (not checked for validity)
    #[arg(long)]
    pub newest_message_id: u64,

    /// An oldest message ID to crawl (not checked for validity)
    #[arg(long)]
    pub oldest_message_id: u64,

    /// A JSON file path to create and write; must not exist
    #[arg(long)]
    pub path: PathBuf,

    /// API base URL
    #[arg(long, hide = true, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Per-request timeout in seconds (default: 30, range: 1-600)
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..=600))]
    pub request_timeout_secs: u64,

    /// Disable the progress spinner
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl Cli {
    /// Build the crawl job from the arguments, prompting for the token if needed
    pub fn build_job(&self) -> Result<CrawlJob, CliError> {
        let token = match &self.token {
            Some(token) => token.clone(),
            None => prompt_token()?,
        };

        let credential = Credential::new(token, self.token_type);
        if credential.is_empty() {
            return Err(CliError::InvalidArgument("token must not be empty".to_string()));
        }

        let range = CrawlRange::new(self.oldest_message_id, self.newest_message_id)?;

        let path = std::path::absolute(&self.path).map_err(|e| {
            CliError::InvalidArgument(format!("Invalid path {}: {e}", self.path.display()))
        })?;
        if path.is_dir() {
            return Err(CliError::InvalidArgument(format!(
                "{} is a directory, expected a file path",
                path.display()
            )));
        }

        Ok(CrawlJob::new(credential, self.channel_id, range, path))
    }

    /// Run the crawl and log the summary
    pub async fn execute(&self) -> Result<CrawlSummary, CliError> {
        let job = self.build_job()?;

        let observer: SharedObserver = if self.no_progress {
            Arc::new(NoopObserver)
        } else {
            Arc::new(ProgressObserver::new())
        };

        let executor = CrawlExecutor::new()
            .with_api_base(self.api_base.clone())
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_observer(observer);

        let summary = executor.execute(&job).await?;
        report_summary(&summary);
        Ok(summary)
    }
}

impl fmt::Debug for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cli")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("channel_id", &self.channel_id)
            .field("newest_message_id", &self.newest_message_id)
            .field("oldest_message_id", &self.oldest_message_id)
            .field("path", &self.path)
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("no_progress", &self.no_progress)
            .finish()
    }
}

/// Ask for the token without echoing it
fn prompt_token() -> Result<String, CliError> {
    dialoguer::Password::new()
        .with_prompt("Token")
        .interact()
        .map_err(|e| CliError::PromptError(e.to_string()))
}

/// Log the final crawl report
pub fn report_summary(summary: &CrawlSummary) {
    info!("Done crawling {} messages!", summary.message_count);

    match (summary.id_range(), summary.timestamp_range()) {
        (Some((oldest_id, newest_id)), Some((oldest_ts, newest_ts))) => {
            info!("Message IDs: from {} to {}", oldest_id, newest_id);
            info!("Message Timestamps: from {} to {}", oldest_ts, newest_ts);
        }
        _ => info!("No messages matched the requested ID range"),
    }
}
