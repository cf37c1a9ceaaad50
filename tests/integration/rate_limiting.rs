//! Rate-limit handling across a whole crawl

use crate::common::{page_json, RecordingObserver, ScriptedResponse, ScriptedServer};
use discord_chat_exporter::crawler::{
    CrawlError, CrawlExecutor, CrawlJob, CrawlRange, Credential, TokenType,
};
use discord_chat_exporter::fetcher::FetcherError;
use serde_json::json;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn job(path: &Path) -> CrawlJob {
    CrawlJob::new(
        Credential::new("secret", TokenType::Bot),
        9,
        CrawlRange::new(0u64, 50u64).unwrap(),
        path,
    )
}

fn executor(server: &ScriptedServer, observer: std::sync::Arc<RecordingObserver>) -> CrawlExecutor {
    CrawlExecutor::new()
        .with_api_base(server.api_base())
        .with_request_timeout(Duration::from_secs(5))
        .with_observer(observer)
}

#[tokio::test]
async fn test_waits_retry_after_then_succeeds() {
    let server = ScriptedServer::start(vec![
        ScriptedResponse::rate_limited(50),
        ScriptedResponse::json(200, page_json(50, 3)),
    ])
    .await;
    let observer = RecordingObserver::shared();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out.json");

    let started = Instant::now();
    let summary = executor(&server, observer.clone())
        .execute(&job(&path))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(summary.message_count, 3);
    assert_eq!(
        *observer.rate_limits.lock().unwrap(),
        vec![(1, Duration::from_millis(50))]
    );

    let lines = server.request_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], lines[1]);
}

#[tokio::test]
async fn test_fractional_retry_after_is_honoured() {
    let server = ScriptedServer::start(vec![
        ScriptedResponse::json(429, json!({"message": "slow down", "retry_after": 12.5})),
        ScriptedResponse::json(200, json!([])),
    ])
    .await;
    let observer = RecordingObserver::shared();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out.json");

    executor(&server, observer.clone())
        .execute(&job(&path))
        .await
        .unwrap();

    let rate_limits = observer.rate_limits.lock().unwrap().clone();
    assert_eq!(rate_limits.len(), 1);
    let micros = rate_limits[0].1.as_micros();
    assert!((12_499..=12_501).contains(&micros), "delay was {micros}us");
}

#[tokio::test]
async fn test_five_rate_limits_exhaust_the_request() {
    let mut script: Vec<_> = (0..5).map(|_| ScriptedResponse::rate_limited(5)).collect();
    script.push(ScriptedResponse::json(200, page_json(50, 3)));
    let server = ScriptedServer::start(script).await;
    let observer = RecordingObserver::shared();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out.json");

    let err = executor(&server, observer.clone())
        .execute(&job(&path))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CrawlError::Fetcher(FetcherError::RetryExhausted { attempts: 5, .. })
    ));
    assert_eq!(server.request_lines().len(), 5);
    // No wait is scheduled after the final attempt.
    assert_eq!(observer.rate_limit_count(), 4);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
}

#[tokio::test]
async fn test_attempt_budget_resets_for_each_page() {
    let mut script = Vec::new();
    script.extend((0..4).map(|_| ScriptedResponse::rate_limited(5)));
    script.push(ScriptedResponse::json(200, page_json(1000, 100)));
    script.extend((0..4).map(|_| ScriptedResponse::rate_limited(5)));
    script.push(ScriptedResponse::json(200, json!([])));
    let server = ScriptedServer::start(script).await;
    let observer = RecordingObserver::shared();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out.json");

    let job = CrawlJob::new(
        Credential::new("secret", TokenType::Bot),
        9,
        CrawlRange::new(0u64, 1000u64).unwrap(),
        &path,
    );
    let summary = executor(&server, observer.clone())
        .execute(&job)
        .await
        .unwrap();

    assert_eq!(summary.message_count, 100);
    assert_eq!(observer.rate_limit_count(), 8);

    let lines = server.request_lines();
    assert_eq!(lines.len(), 10);
    assert!(lines[..5].iter().all(|l| l.contains("before=1001")));
    assert!(lines[5..].iter().all(|l| l.contains("before=901")));
}
