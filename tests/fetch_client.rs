use std::sync::{Arc, Mutex};

use craftline::core::downloader::{
    ignore_chunks, ChunkProgress, DownloadTask, FetchClient, FetchRequest, RetryPolicy, CHUNK_SIZE,
};
use craftline::LauncherError;
use httpmock::prelude::*;

const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

fn client() -> FetchClient {
    craftline::init_logging();
    FetchClient::new(RetryPolicy::new(3, 1)).unwrap()
}

#[tokio::test]
async fn server_errors_exhaust_the_retry_budget() {
    let server = MockServer::start_async().await;
    let failing = server
        .mock_async(|when, then| {
            when.method(GET).path("/flaky");
            then.status(500);
        })
        .await;

    let err = client()
        .fetch(FetchRequest::get(server.url("/flaky")))
        .await
        .unwrap_err();

    match err {
        LauncherError::TransientNetwork { attempts, .. } => assert_eq!(attempts, 4),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(failing.hits_async().await, 4);
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start_async().await;
    let missing = server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        })
        .await;

    let err = client()
        .fetch(FetchRequest::get(server.url("/missing")))
        .await
        .unwrap_err();

    assert!(err.is_http_not_found());
    assert_eq!(missing.hits_async().await, 1);
}

#[tokio::test]
async fn throttling_is_retried() {
    let server = MockServer::start_async().await;
    let throttled = server
        .mock_async(|when, then| {
            when.method(GET).path("/busy");
            then.status(429);
        })
        .await;

    let result = client().fetch(FetchRequest::get(server.url("/busy"))).await;

    assert!(matches!(result, Err(LauncherError::TransientNetwork { .. })));
    assert_eq!(throttled.hits_async().await, 4);
}

#[tokio::test]
async fn json_bodies_are_decoded() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/doc").query_param("q", "fabric api");
            then.status(200).json_body(serde_json::json!({"name": "craftline"}));
        })
        .await;

    let request = FetchRequest::get(server.url("/doc"))
        .query(&[("q", "fabric api")])
        .unwrap();
    let doc: serde_json::Value = client().fetch_json(request).await.unwrap();
    assert_eq!(doc["name"], "craftline");
}

#[tokio::test]
async fn hash_mismatch_leaves_nothing_behind() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/hello.txt");
            then.status(200).body("hello");
        })
        .await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("files/hello.txt");
    let fetch = client();

    let bad = DownloadTask::new(server.url("/hello.txt"), &dest).sha1("0".repeat(40));
    let err = fetch.download(&bad, &ignore_chunks).await.unwrap_err();
    assert!(matches!(err, LauncherError::Integrity { algorithm: "sha1", .. }));
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dest.parent().unwrap()).unwrap().count(), 0);

    let good = DownloadTask::new(server.url("/hello.txt"), &dest)
        .sha1(HELLO_SHA1)
        .size(Some(5));
    assert_eq!(fetch.download(&good, &ignore_chunks).await.unwrap(), 5);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello");
    assert_eq!(std::fs::read_dir(dest.parent().unwrap()).unwrap().count(), 1);
}

#[tokio::test]
async fn size_mismatch_is_an_integrity_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/short");
            then.status(200).body("hello");
        })
        .await;
    let dir = tempfile::tempdir().unwrap();

    let task = DownloadTask::new(server.url("/short"), dir.path().join("short")).size(Some(6));
    let err = client().download(&task, &ignore_chunks).await.unwrap_err();
    assert!(matches!(err, LauncherError::Integrity { algorithm: "size", .. }));
}

#[tokio::test]
async fn streaming_reports_bounded_chunks() {
    let server = MockServer::start_async().await;
    let body = vec![7u8; 20_000];
    server
        .mock_async(|when, then| {
            when.method(GET).path("/blob");
            then.status(200).body(body.clone());
        })
        .await;

    let mut seen = Vec::new();
    let total = client()
        .fetch_streaming(FetchRequest::get(server.url("/blob")), |piece, progress| {
            assert!(piece.len() <= CHUNK_SIZE);
            seen.push(progress);
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(total, 20_000);
    assert_eq!(seen.iter().map(|p| p.chunk_len).sum::<u64>(), 20_000);
    assert_eq!(seen.last().unwrap().bytes_so_far, 20_000);
    assert_eq!(seen[0].total_bytes, Some(20_000));
}

#[tokio::test]
async fn batch_returns_only_failures() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/a");
            then.status(200).body("hello");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/b");
            then.status(404);
        })
        .await;
    let dir = tempfile::tempdir().unwrap();
    let progress: Arc<Mutex<Vec<ChunkProgress>>> = Arc::default();
    let sink = progress.clone();

    let failed = client()
        .download_batch(
            vec![
                DownloadTask::new(server.url("/a"), dir.path().join("a")).sha1(HELLO_SHA1),
                DownloadTask::new(server.url("/b"), dir.path().join("b")),
            ],
            &move |chunk| sink.lock().unwrap().push(chunk),
        )
        .await;

    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0.file_name(), "b");
    assert!(dir.path().join("a").exists());
    assert!(!progress.lock().unwrap().is_empty());
}
