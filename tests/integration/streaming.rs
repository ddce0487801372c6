//! Streaming relay integration tests
//!
//! Tests for streamed targets:
//! - Chunks relayed in order with event-stream headers
//! - Upstream rejection before commit becomes a JSON error
//! - Upstream failure after commit terminates the body

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use genrelay::{proxy::Dispatch, StaticCredential};

use crate::common::{build_app, scripted_server, test_data, RelayTestHarness};
use crate::mocks::{ScriptedDispatcher, Step, STREAM_PATH, TEST_API_KEY};

fn stream_request() -> Value {
    test_data::relay_request("geminiStream", test_data::text_payload())
}

#[tokio::test]
async fn test_stream_relays_chunks_in_order() {
    let harness = RelayTestHarness::new().await;
    harness
        .upstream
        .mock_stream(&[
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}]}}]}\r\n\r\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"lo\"}]}}]}\r\n\r\n",
        ])
        .await;

    let response = harness.server.post("/api/generate").json(&stream_request()).await;

    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/event-stream");
    assert_eq!(response.header("cache-control"), "no-cache");
    assert_eq!(
        response.text(),
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}]}}]}\r\n\r\n\
         data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"lo\"}]}}]}\r\n\r\n"
    );

    let requests = harness.upstream.received_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), STREAM_PATH);
    assert!(requests[0]
        .url
        .query_pairs()
        .any(|(k, v)| k == "key" && v == TEST_API_KEY));
}

#[tokio::test]
async fn test_stream_upstream_rejection_is_json_error() {
    let harness = RelayTestHarness::new().await;
    harness
        .upstream
        .mock_stream_error(400, "{\"error\":{\"message\":\"bad contents\"}}")
        .await;

    let response = harness.server.post("/api/generate").json(&stream_request()).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.header("content-type"), "application/json");
    let json: Value = response.json();
    assert_eq!(json["details"], "{\"error\":{\"message\":\"bad contents\"}}");
}

#[tokio::test]
async fn test_scripted_stream_concatenates_chunks() {
    let dispatcher = Arc::new(ScriptedDispatcher::new(vec![
        Step::Chunk("ab"),
        Step::Chunk("cd"),
        Step::Chunk("ef"),
    ]));
    let server = scripted_server(dispatcher.clone());

    let response = server.post("/api/generate").json(&stream_request()).await;

    response.assert_status_ok();
    assert_eq!(response.text(), "abcdef");
    assert_eq!(dispatcher.calls(), 1);
}

#[tokio::test]
async fn test_scripted_rejection_keeps_upstream_status() {
    let dispatcher = Arc::new(ScriptedDispatcher::rejecting(
        StatusCode::SERVICE_UNAVAILABLE,
        "overloaded",
    ));
    let server = scripted_server(dispatcher);

    let response = server.post("/api/generate").json(&stream_request()).await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = response.json();
    assert_eq!(json["details"], "overloaded");
}

#[tokio::test]
async fn test_failure_after_commit_terminates_body() {
    let dispatcher: Arc<dyn Dispatch> = Arc::new(ScriptedDispatcher::new(vec![
        Step::Chunk("ab"),
        Step::Fail("connection reset by peer"),
        Step::Chunk("never sent"),
    ]));
    let app = build_app(
        "http://upstream.invalid/v1beta",
        Arc::new(StaticCredential::new(TEST_API_KEY)),
        dispatcher,
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(stream_request().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // Headers were committed with success before the failure
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let mut body = response.into_body();

    let first = body.frame().await.unwrap().unwrap();
    assert_eq!(first.into_data().unwrap(), "ab");

    let second = body.frame().await.unwrap();
    assert!(second.is_err());
}
