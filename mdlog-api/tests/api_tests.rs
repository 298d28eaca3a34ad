//! Integration tests for the HTTP API.
//!
//! Uses `tower::ServiceExt::oneshot` to call handlers without binding a real
//! TCP port — every test gets a fresh temp log directory.

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use mdlog_api::{AppState, build_router};
use mdlog_core::config::{MetricsConfig, ServerConfig};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt; // .oneshot()

// ── Helper ────────────────────────────────────────────────────

fn config_for(dir: &Path) -> ServerConfig {
    ServerConfig {
        log_file_path: dir.to_path_buf(),
        ..ServerConfig::default()
    }
}

fn make_state(dir: &Path) -> Arc<AppState> {
    Arc::new(AppState::new(&config_for(dir)).unwrap())
}

fn post_log(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/log")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn log_file(dir: &Path) -> PathBuf {
    dir.join("error_log.md")
}

fn failure_body() -> Value {
    json!({ "error": "Failed to save log" })
}

// ── POST /log ────────────────────────────────────────────────

#[tokio::test]
async fn post_log_returns_200_with_filename() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(make_state(dir.path()));

    let resp = app
        .oneshot(post_log(json!({"level": "error", "msg": "boom"}).to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({ "message": "Log saved successfully", "filename": "error_log.md" })
    );

    let content = std::fs::read_to_string(log_file(dir.path())).unwrap();
    assert!(content.starts_with("# "));
    assert!(content.contains(" 未解決\n\n```javascript\n"));
    assert!(content.contains("\"msg\": \"boom\""));
}

#[tokio::test]
async fn post_log_uses_record_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(make_state(dir.path()));

    let resp = app
        .oneshot(post_log(r#"{"timestamp":"2023-05-01T00:00:00Z","x":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let content = std::fs::read_to_string(log_file(dir.path())).unwrap();
    // The exact wall-clock rendering depends on the local zone; the date is
    // 2023/04/30 or 2023/05/01 for every real offset.
    let title = content.lines().next().unwrap();
    assert!(
        title.starts_with("# 2023/05/01 ") || title.starts_with("# 2023/04/30 "),
        "unexpected title {title}"
    );
}

#[tokio::test]
async fn post_log_keeps_key_order_in_body() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(make_state(dir.path()));

    app.oneshot(post_log(r#"{"zeta":1,"alpha":2}"#)).await.unwrap();

    let content = std::fs::read_to_string(log_file(dir.path())).unwrap();
    assert!(content.contains("{\n  \"zeta\": 1,\n  \"alpha\": 2\n}"));
}

#[tokio::test]
async fn empty_json_body_logs_empty_object() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(make_state(dir.path()));

    let resp = app.oneshot(post_log(Body::empty())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let content = std::fs::read_to_string(log_file(dir.path())).unwrap();
    assert!(content.contains("```javascript\n{}\n```\n\n"));
}

#[tokio::test]
async fn malformed_json_returns_500_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(make_state(dir.path()));

    let resp = app.oneshot(post_log("not-valid-json")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, failure_body());
    assert!(!log_file(dir.path()).exists());
}

#[tokio::test]
async fn non_object_json_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(make_state(dir.path()));

    let resp = app.oneshot(post_log("[1, 2, 3]")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, failure_body());
}

#[tokio::test]
async fn wrong_content_type_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(make_state(dir.path()));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/log")
        .header("content-type", "text/plain")
        .body(Body::from(r#"{"a":1}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, failure_body());
}

#[tokio::test]
async fn oversized_body_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        body_limit_bytes: 64,
        ..config_for(dir.path())
    };
    let app = build_router(Arc::new(AppState::new(&config).unwrap()));

    let big = json!({ "pad": "x".repeat(1024) }).to_string();
    let resp = app.oneshot(post_log(big)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, failure_body());
    assert!(!log_file(dir.path()).exists());
}

#[tokio::test]
async fn io_failure_returns_500_and_server_keeps_serving() {
    let root = tempfile::tempdir().unwrap();
    // A regular file where the log directory should be forces create_dir_all
    // to fail, even when running as root.
    let blocker = root.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let app = build_router(make_state(&blocker.join("logs")));

    let resp = app
        .clone()
        .oneshot(post_log(r#"{"level":"error"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, failure_body());

    // Same router still answers afterwards.
    let resp = app.clone().oneshot(get_req("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Clearing the obstruction lets the next append succeed.
    std::fs::remove_file(&blocker).unwrap();
    let resp = app.oneshot(post_log(r#"{"level":"error"}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn repeated_posts_append_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(make_state(dir.path()));

    for n in 0..3 {
        let resp = app
            .clone()
            .oneshot(post_log(json!({ "n": n }).to_string()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let content = std::fs::read_to_string(log_file(dir.path())).unwrap();
    assert_eq!(content.matches(" 未解決\n").count(), 3);
    let first = content.find("\"n\": 0").unwrap();
    let second = content.find("\"n\": 1").unwrap();
    let third = content.find("\"n\": 2").unwrap();
    assert!(first < second && second < third);
}

#[tokio::test]
async fn get_log_is_not_routed() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(make_state(dir.path()));
    let resp = app.oneshot(get_req("/log")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ── Health ────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_log_file_state() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path());

    let resp = build_router(Arc::clone(&state))
        .oneshot(get_req("/health"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["status"], "ok");
    assert_eq!(j["log_file"]["file_exists"], false);
    assert!(j["log_file"]["size_bytes"].is_null());

    build_router(Arc::clone(&state))
        .oneshot(post_log(r#"{"a":1}"#))
        .await
        .unwrap();

    let resp = build_router(state).oneshot(get_req("/health")).await.unwrap();
    let j = body_json(resp).await;
    assert_eq!(j["log_file"]["file_exists"], true);
    assert!(j["log_file"]["size_bytes"].as_u64().unwrap() > 0);
}

// ── Metrics ───────────────────────────────────────────────────

#[tokio::test]
async fn metrics_empty_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(make_state(dir.path()));
    let resp = app.oneshot(get_req("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "");
}

#[tokio::test]
async fn metrics_count_successes_and_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        metrics: MetricsConfig { enabled: true },
        ..config_for(dir.path())
    };
    let state = Arc::new(AppState::new(&config).unwrap());

    build_router(Arc::clone(&state))
        .oneshot(post_log(r#"{"a":1}"#))
        .await
        .unwrap();
    build_router(Arc::clone(&state))
        .oneshot(post_log("{broken"))
        .await
        .unwrap();

    let resp = build_router(state).oneshot(get_req("/metrics")).await.unwrap();
    let text = body_text(resp).await;
    assert!(text.contains("mdlog_entries_appended_total 1"), "{text}");
    assert!(text.contains("mdlog_append_failures_total{kind=\"parse\"} 1"), "{text}");
}
