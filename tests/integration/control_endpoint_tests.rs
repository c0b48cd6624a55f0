//! Integration tests for the control endpoint router.
//!
//! Requests go straight into the axum router via `tower::ServiceExt`, no
//! socket involved.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use crate::mock_hw::Rig;

use occupancy::adapters::control_server::router;
use occupancy::app::shared::SharedContext;
use occupancy::config::PresenceConfig;

fn shared() -> SharedContext {
    Rig::new(PresenceConfig::default()).shared()
}

async fn call(shared: &SharedContext, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = router(shared.clone())
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_reports_running_and_active() {
    let shared = shared();
    let (status, json) = call(&shared, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["running"], true);
    assert_eq!(json["active"], true);
}

#[tokio::test]
async fn sleep_is_idempotent() {
    let shared = shared();
    for _ in 0..2 {
        let (status, json) = call(&shared, Method::POST, "/sleep").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
        assert_eq!(json["active"], false);
    }
    assert!(!shared.is_active());

    let (_, json) = call(&shared, Method::GET, "/health").await;
    assert_eq!(json["active"], false);
}

#[tokio::test]
async fn wake_restores_active() {
    let shared = shared();
    call(&shared, Method::POST, "/sleep").await;
    let (status, json) = call(&shared, Method::POST, "/wake").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "ok": true, "active": true }));
    assert!(shared.is_active());
}

#[tokio::test]
async fn quit_requests_shutdown() {
    let shared = shared();
    let (status, json) = call(&shared, Method::POST, "/quit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "ok": true, "quitting": true }));
    assert!(shared.shutdown_requested());
}

#[tokio::test]
async fn unknown_path_is_404() {
    let shared = shared();
    let (status, json) = call(&shared, Method::GET, "/reboot").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not found");
}

#[tokio::test]
async fn wrong_method_is_404() {
    let shared = shared();
    let (status, json) = call(&shared, Method::GET, "/quit").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not found");
    assert!(!shared.shutdown_requested());

    let (status, _) = call(&shared, Method::POST, "/health").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
