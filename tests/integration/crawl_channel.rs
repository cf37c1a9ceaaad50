//! End-to-end crawls against a mock Discord API

use crate::common::{page_json, RecordingObserver};
use discord_chat_exporter::crawler::{
    CrawlError, CrawlExecutor, CrawlJob, CrawlRange, Credential, TokenType,
};
use discord_chat_exporter::fetcher::FetcherError;
use discord_chat_exporter::MessageId;
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const CHANNEL: &str = "/api/v6/channels/42/messages";

fn executor(server: &MockServer) -> CrawlExecutor {
    CrawlExecutor::new()
        .with_api_base(format!("{}/api/v6", server.base_url()))
        .with_request_timeout(Duration::from_secs(5))
}

fn job(oldest: u64, newest: u64, path: &Path) -> CrawlJob {
    CrawlJob::new(
        Credential::new("secret", TokenType::Bot),
        42,
        CrawlRange::new(oldest, newest).unwrap(),
        path,
    )
}

fn read_file(path: &Path) -> (String, Vec<Value>) {
    let contents = std::fs::read_to_string(path).unwrap();
    let values = serde_json::from_str(&contents).unwrap();
    (contents, values)
}

#[tokio::test]
async fn test_crawl_two_pages() {
    let server = MockServer::start_async().await;
    let first = server.mock(|when, then| {
        when.method(GET)
            .path(CHANNEL)
            .query_param("before", "1001")
            .query_param("limit", "100")
            .header("Authorization", "Bot secret");
        then.status(200).json_body(page_json(1000, 100));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path(CHANNEL)
            .query_param("before", "901")
            .query_param("limit", "100");
        then.status(200).json_body(page_json(900, 37));
    });

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("channel.json");

    let summary = executor(&server).execute(&job(0, 1000, &path)).await.unwrap();

    assert_eq!(summary.message_count, 137);
    assert_eq!(summary.id_range(), Some((MessageId(864), MessageId(1000))));
    first.assert_calls(1);
    second.assert_calls(1);

    let (contents, values) = read_file(&path);
    assert!(contents.starts_with('['));
    assert!(contents.ends_with(']'));
    assert_eq!(values.len(), 137);
    assert_eq!(values[0]["id"], "1000");
    assert_eq!(values[136]["id"], "864");
    assert_eq!(values[0]["author"]["username"], "tester");
}

#[tokio::test]
async fn test_crawl_filters_below_oldest_and_stops() {
    let server = MockServer::start_async().await;
    let first = server.mock(|when, then| {
        when.method(GET).path(CHANNEL).query_param("before", "1001");
        then.status(200).json_body(page_json(1000, 100));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path(CHANNEL).query_param("before", "901");
        then.status(200).json_body(page_json(900, 100));
    });
    let third = server.mock(|when, then| {
        when.method(GET).path(CHANNEL).query_param("before", "801");
        then.status(200).json_body(page_json(800, 5));
    });

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("channel.json");

    // Only 1000..=950 survive the first page; the rest is paged but dropped.
    let summary = executor(&server).execute(&job(950, 1000, &path)).await.unwrap();

    assert_eq!(summary.message_count, 51);
    assert_eq!(summary.id_range(), Some((MessageId(950), MessageId(1000))));
    first.assert_calls(1);
    second.assert_calls(1);
    third.assert_calls(1);

    let (_, values) = read_file(&path);
    assert_eq!(values.len(), 51);
    assert!(values
        .iter()
        .all(|v| v["id"].as_str().unwrap().parse::<u64>().unwrap() >= 950));
}

#[tokio::test]
async fn test_crawl_with_no_matching_messages() {
    let server = MockServer::start_async().await;
    let first = server.mock(|when, then| {
        when.method(GET).path(CHANNEL).query_param("before", "1001");
        then.status(200).json_body(page_json(1000, 100));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path(CHANNEL).query_param("before", "901");
        then.status(200).json_body(json!([]));
    });

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("channel.json");

    let summary = executor(&server).execute(&job(5000, 1000, &path)).await.unwrap();

    assert!(summary.is_empty());
    assert_eq!(summary.oldest, None);
    assert_eq!(summary.newest, None);
    first.assert_calls(1);
    second.assert_calls(1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
}

#[tokio::test]
async fn test_crawl_reports_to_observer() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path(CHANNEL).query_param("before", "1001");
        then.status(200).json_body(page_json(1000, 100));
    });
    server.mock(|when, then| {
        when.method(GET).path(CHANNEL).query_param("before", "901");
        then.status(200).json_body(page_json(900, 37));
    });

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("channel.json");
    let observer = RecordingObserver::shared();

    let summary = executor(&server)
        .with_observer(observer.clone())
        .execute(&job(0, 1000, &path))
        .await
        .unwrap();

    assert_eq!(
        *observer.requests.lock().unwrap(),
        vec![MessageId(1001), MessageId(901)]
    );
    assert_eq!(
        *observer.pages.lock().unwrap(),
        vec![(1, 100, 100), (2, 37, 137)]
    );
    assert_eq!(observer.rate_limit_count(), 0);
    assert_eq!(observer.finished.lock().unwrap().as_ref(), Some(&summary));
}

#[tokio::test]
async fn test_protocol_error_mid_crawl_keeps_written_pages() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path(CHANNEL).query_param("before", "1001");
        then.status(200).json_body(page_json(1000, 100));
    });
    let forbidden = server.mock(|when, then| {
        when.method(GET).path(CHANNEL).query_param("before", "901");
        then.status(403).json_body(json!({"message": "Missing Access", "code": 50001}));
    });

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("channel.json");

    let err = executor(&server).execute(&job(0, 1000, &path)).await.unwrap_err();

    assert!(matches!(
        err,
        CrawlError::Fetcher(FetcherError::Protocol { status: 403, .. })
    ));
    assert_eq!(err.http_status(), Some(403));
    forbidden.assert_calls(1);

    let (contents, values) = read_file(&path);
    assert!(contents.ends_with(']'));
    assert_eq!(values.len(), 100);
}
