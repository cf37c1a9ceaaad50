//! An existing destination aborts the crawl before any request

use discord_chat_exporter::crawler::{
    CrawlError, CrawlExecutor, CrawlJob, CrawlRange, Credential, TokenType,
};
use discord_chat_exporter::output::OutputError;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_existing_output_file_is_not_overwritten() {
    let server = MockServer::start_async().await;
    let messages_mock = server.mock(|when, then| {
        when.method(GET).path("/api/v6/channels/42/messages");
        then.status(200).json_body(json!([]));
    });

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("channel.json");
    std::fs::write(&path, "previous export").unwrap();

    let job = CrawlJob::new(
        Credential::new("secret", TokenType::User),
        42,
        CrawlRange::new(0u64, 1000u64).unwrap(),
        &path,
    );
    let err = CrawlExecutor::new()
        .with_api_base(format!("{}/api/v6", server.base_url()))
        .execute(&job)
        .await
        .unwrap_err();

    match err {
        CrawlError::Output(OutputError::Conflict { path: conflicting }) => {
            assert_eq!(conflicting, path)
        }
        other => panic!("expected a conflict, got {other:?}"),
    }
    messages_mock.assert_calls(0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous export");
}

#[tokio::test]
async fn test_error_message_names_the_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("taken.json");
    std::fs::write(&path, "[]").unwrap();

    let job = CrawlJob::new(
        Credential::new("secret", TokenType::Bot),
        1,
        CrawlRange::new(0u64, 10u64).unwrap(),
        &path,
    );
    // The closed port is never contacted.
    let err = CrawlExecutor::new()
        .with_api_base("http://127.0.0.1:1/api/v6")
        .execute(&job)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("already exists"), "{message}");
    assert!(message.contains("taken.json"), "{message}");
}
