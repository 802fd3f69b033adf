//! Boots the router on a random port and talks to it over HTTP.

use std::sync::Arc;

use harvester_server::{build_router, start_server, AppState, Archive, ArchiveRecord};
use serde_json::{json, Value};

async fn spawn(state: AppState) -> String {
    let addr = start_server(build_router(state), ([127, 0, 0, 1], 0).into())
        .await
        .unwrap();
    format!("http://{addr}")
}

#[tokio::test]
async fn summarize_accepts_a_submission() {
    let base = spawn(AppState::default()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/summarize"))
        .json(&json!({
            "url": "https://a.example/post",
            "title": "Ownership in Rust",
            "content": "Ownership moves values. Borrowing lends them. Lifetimes track borrowing."
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["summary"], "Ownership moves values. Borrowing lends them.");
    assert_eq!(body["tags"][0], "ownership");
    assert_eq!(body["tags"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn legacy_field_names_are_accepted() {
    let base = spawn(AppState::default()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/summarize"))
        .json(&json!({ "tabId": 17, "bodyText": "Plain text only." }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["summary"], "Plain text only.");
}

#[tokio::test]
async fn malformed_json_is_a_400() {
    let base = spawn(AppState::default()).await;
    let client = reqwest::Client::new();

    for body in ["{not json", r#"{"url":"https://a.example"}"#] {
        let resp = client
            .post(format!("{base}/api/summarize"))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "error");
        assert!(body["detail"].as_str().unwrap().contains("invalid JSON"));
    }
}

#[tokio::test]
async fn unknown_paths_and_methods_are_404() {
    let base = spawn(AppState::default()).await;
    let client = reqwest::Client::new();

    let wrong_path = client.post(format!("{base}/api/other")).send().await.unwrap();
    let wrong_method = client.get(format!("{base}/api/summarize")).send().await.unwrap();
    let wrong_health = client.post(format!("{base}/health")).send().await.unwrap();

    assert_eq!(wrong_path.status(), 404);
    assert_eq!(wrong_method.status(), 404);
    assert_eq!(wrong_health.status(), 404);
}

#[tokio::test]
async fn preflight_is_answered_permissively() {
    let base = spawn(AppState::default()).await;

    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/api/summarize"))
        .header("origin", "chrome-extension://abcdef")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()["access-control-allow-origin"].to_str().unwrap(),
        "*"
    );
    assert!(resp.headers().contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn health_reports_healthy() {
    let base = spawn(AppState::default()).await;

    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn accepted_submissions_are_archived() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("archive.jsonl");
    let base = spawn(AppState {
        archive: Some(Arc::new(Archive::new(&path))),
    })
    .await;
    let client = reqwest::Client::new();

    for url in ["https://a.example", "https://b.example"] {
        let resp = client
            .post(format!("{base}/api/summarize"))
            .json(&json!({ "url": url, "title": "T", "content": "Short page." }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let lines: Vec<ArchiveRecord> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].url, "https://a.example");
    assert_eq!(lines[1].summary, "Short page.");
    assert!(chrono::DateTime::parse_from_rfc3339(&lines[0].archived_at).is_ok());
}

#[tokio::test]
async fn failed_archive_write_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be opened for appending.
    let base = spawn(AppState {
        archive: Some(Arc::new(Archive::new(dir.path()))),
    })
    .await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/summarize"))
        .json(&json!({ "url": "https://a.example", "content": "Text." }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
}
