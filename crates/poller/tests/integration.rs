//! Integration tests for the HTTP build-status provider.
//!
//! Runs the provider against an in-process Axum stub of the build service.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use serde_json::{Value, json};

use buildrelay_common::error::RelayError;
use buildrelay_common::types::BuildStatus;
use buildrelay_poller::{BuildStatusProvider, HttpBuildStatusProvider, PollPolicy, StatusPoller};

// ============================================================
// Helpers
// ============================================================

#[derive(Clone)]
struct StubState {
    calls: Arc<AtomicU32>,
    /// Call number (1-based) from which the build reports completion.
    complete_from: u32,
}

async fn batch_get_builds(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
    let call = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
    let id = body["ids"][0].as_str().unwrap_or_default().to_string();

    if id.starts_with("missing") {
        return Json(json!({ "builds": [], "buildsNotFound": [id] }));
    }

    let complete = call >= state.complete_from;
    Json(json!({
        "builds": [{
            "id": id,
            "buildComplete": complete,
            "buildStatus": if complete { "SUCCEEDED" } else { "IN_PROGRESS" },
            "currentPhase": if complete { "COMPLETED" } else { "BUILD" },
            "startTime": 1700000000.0
        }],
        "buildsNotFound": []
    }))
}

/// Start a stub build service and return its URL plus the call counter.
async fn spawn_build_service(complete_from: u32) -> (String, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let state = StubState {
        calls: calls.clone(),
        complete_from,
    };
    let app = Router::new()
        .route("/batch-get-builds", post(batch_get_builds))
        .route(
            "/broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), calls)
}

fn provider(base: &str, path: &str) -> HttpBuildStatusProvider {
    HttpBuildStatusProvider::new(reqwest::Client::new(), format!("{base}{path}"))
}

// ============================================================
// Tests
// ============================================================

#[tokio::test]
async fn test_fetch_parses_build_record() {
    let (base, calls) = spawn_build_service(1).await;
    let provider = provider(&base, "/batch-get-builds");

    let detail = provider.fetch("proj-a:1234").await.unwrap();

    assert!(detail.complete);
    assert_eq!(detail.status, BuildStatus::Succeeded);
    assert_eq!(detail.id(), Some("proj-a:1234"));
    assert_eq!(detail.extra["currentPhase"], "COMPLETED");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetch_reports_missing_build() {
    let (base, _) = spawn_build_service(1).await;
    let provider = provider(&base, "/batch-get-builds");

    let err = provider.fetch("missing:1").await.unwrap_err();
    assert!(matches!(err, RelayError::BuildNotFound(id) if id == "missing:1"));
}

#[tokio::test]
async fn test_fetch_surfaces_http_errors() {
    let (base, _) = spawn_build_service(1).await;
    let provider = provider(&base, "/broken");

    let err = provider.fetch("proj-a:1").await.unwrap_err();
    match err {
        RelayError::Provider(message) => assert!(message.contains("upstream exploded")),
        other => panic!("expected Provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_poller_queries_until_complete() {
    let (base, calls) = spawn_build_service(2).await;
    let poller = StatusPoller::new(
        Arc::new(provider(&base, "/batch-get-builds")),
        PollPolicy::new(3, Duration::ZERO),
    );

    let detail = poller.poll("proj-a:1234").await.unwrap();

    assert!(detail.complete);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_poller_times_out_against_slow_build() {
    let (base, calls) = spawn_build_service(u32::MAX).await;
    let poller = StatusPoller::new(
        Arc::new(provider(&base, "/batch-get-builds")),
        PollPolicy::new(3, Duration::ZERO),
    );

    let err = poller.poll("proj-a:1234").await.unwrap_err();

    assert!(matches!(err, RelayError::BuildPollTimeout { attempts: 3, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
