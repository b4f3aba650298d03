//! HTTP surface tests, driven through the router without a listener

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use robot_gateway::state::ServiceTasks;
use robot_gateway::{create_router, AppState, GatewayConfig};

fn app() -> (Router, ServiceTasks) {
    let (state, tasks) = AppState::start(&GatewayConfig::default());
    (create_router(state), tasks)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _tasks) = app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_create_order_is_queued() {
    let (app, _tasks) = app();

    let (status, body) = send(
        &app,
        post_json("/v1/orders", json!({ "owner_id": "owner-1", "order_id": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!({ "order_id": 42, "status": "QUEUED" }));

    let (status, body) = send(&app, get("/v1/dispatch/queues")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pending_orders"], 1);
    assert_eq!(body["next_orders"][0]["order_id"], 42);
    assert_eq!(body["tick_policy"], "single");
}

#[tokio::test]
async fn test_resubmitted_order_queued_once() {
    let (app, _tasks) = app();
    let order = json!({ "owner_id": "owner-1", "order_id": 42 });

    for _ in 0..2 {
        let (status, body) = send(&app, post_json("/v1/orders", order.clone())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["status"], "QUEUED");
    }

    let (_, body) = send(&app, get("/v1/dispatch/queues")).await;
    assert_eq!(body["pending_orders"], 1);
    assert_eq!(body["next_sequence"], 2);
}

#[tokio::test]
async fn test_blank_owner_rejected() {
    let (app, _tasks) = app();

    let (status, body) = send(
        &app,
        post_json("/v1/orders", json!({ "owner_id": " ", "order_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let (app, _tasks) = app();

    let (status, _) = send(&app, post_json("/v1/orders", json!({ "owner_id": "o" }))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_engine_stopped_returns_unavailable() {
    let (app, tasks) = app();
    tasks.engine.abort();
    let _ = tasks.engine.await;

    let (status, body) = send(
        &app,
        post_json("/v1/orders", json!({ "owner_id": "o", "order_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_robots_listing_empty() {
    let (app, _tasks) = app();

    let (status, body) = send(&app, get("/v1/robots")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"], json!([]));
    assert_eq!(body["bound_robots"], 0);
}

#[tokio::test]
async fn test_unknown_robot_not_found() {
    let (app, _tasks) = app();

    let (status, body) = send(&app, get("/v1/robots/robot-404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}
