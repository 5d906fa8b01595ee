//! Router-level tests for the REST endpoints using `tower::ServiceExt`.

#![allow(clippy::panic)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use tokio_test::assert_ok;
use tower::ServiceExt;

use pokedex_gateway::config::GatewayConfig;
use pokedex_gateway::server::{build_app, start_hub};

async fn get(uri: &str, shut_down: bool) -> Response {
    let hub = start_hub(&GatewayConfig::default());
    if shut_down {
        assert_ok!(hub.state.coordinator.shutdown().await);
        let _ = hub.coordinator_task.await;
    }
    let app = build_app(hub.state, "/ws");
    let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
        panic!("invalid request");
    };
    app.oneshot(request)
        .await
        .unwrap_or_else(|never| match never {})
}

async fn json_body(response: Response) -> Value {
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("failed to read body");
    };
    let Ok(json) = serde_json::from_slice(&bytes) else {
        panic!("body is not json");
    };
    json
}

#[tokio::test]
async fn health_reports_healthy() {
    let response = get("/health", false).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json.get("status").and_then(Value::as_str), Some("healthy"));
    assert_eq!(json.get("connections").and_then(Value::as_u64), Some(0));
}

#[tokio::test]
async fn health_degrades_after_shutdown() {
    let response = get("/health", true).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(response).await;
    assert_eq!(json.get("status").and_then(Value::as_str), Some("degraded"));
    assert!(json.get("connections").is_none());
}

#[tokio::test]
async fn root_greets() {
    let response = get("/", false).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn pokemon_lookup_by_id() {
    let response = get("/api/v1/pokemon?id=3", false).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json.get("count").and_then(Value::as_u64), Some(1));
    let name = json
        .get("pokemon")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str);
    assert_eq!(name, Some("Venusaur"));
}

#[tokio::test]
async fn pokemon_lookup_miss_is_empty_not_error() {
    let response = get("/api/v1/pokemon?id=999", false).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json.get("count").and_then(Value::as_u64), Some(0));
}

#[tokio::test]
async fn repeated_filter_is_an_invalid_request() {
    let response = get("/api/v1/pokemon?id=1&id=2", false).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    let code = json
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(Value::as_u64);
    assert_eq!(code, Some(1001));
}

#[tokio::test]
async fn pokemon_without_filters_lists_all() {
    let json = json_body(get("/api/v1/pokemon", false).await).await;
    assert_eq!(json.get("count").and_then(Value::as_u64), Some(10));
}

#[tokio::test]
async fn stats_start_empty() {
    let response = get("/api/v1/hub/stats", false).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json.get("connections").and_then(Value::as_u64), Some(0));
    assert_eq!(json.get("subscriptions").and_then(Value::as_u64), Some(0));
}

#[tokio::test]
async fn stats_after_shutdown_is_unavailable() {
    let response = get("/api/v1/hub/stats", true).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(response).await;
    let code = json
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(Value::as_u64);
    assert_eq!(code, Some(3002));
}
