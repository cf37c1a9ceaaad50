//! CLI command implementation

pub mod crawl;
pub mod error;

pub use crawl::Cli;
pub use error::CliError;
