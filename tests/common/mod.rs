//! Common test utilities for Genrelay
//!
//! This module provides shared fixtures and the test harness used across
//! integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;

use genrelay::{
    proxy::Dispatch, routes, AppState, Config, CredentialSource, EndpointTable, StaticCredential,
    UpstreamDispatcher,
};

use crate::mocks::{MockUpstream, TEST_API_KEY};

/// Sample request bodies
pub mod test_data {
    use serde_json::{json, Value};

    /// Text generation payload in the upstream's own format
    pub fn text_payload() -> Value {
        json!({
            "contents": [
                {"role": "user", "parts": [{"text": "Write a haiku about relays"}]}
            ],
            "generationConfig": {"temperature": 0.7}
        })
    }

    /// Image generation payload in the upstream's own format
    pub fn image_payload() -> Value {
        json!({
            "instances": [{"prompt": "a lighthouse at dusk"}],
            "parameters": {"sampleCount": 1}
        })
    }

    /// Relay request body for `target_id`
    pub fn relay_request(target_id: &str, payload: Value) -> Value {
        json!({ "targetId": target_id, "payload": payload })
    }
}

fn test_config(upstream_uri: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        upstream_base_url: upstream_uri.to_string(),
        ..Config::default()
    }
}

/// Build the real router around explicit parts
pub fn build_app(
    upstream_uri: &str,
    credentials: Arc<dyn CredentialSource>,
    dispatcher: Arc<dyn Dispatch>,
) -> Router {
    let config = test_config(upstream_uri);
    let endpoints =
        EndpointTable::builtin(&config.upstream_base_url).expect("Failed to build endpoint table");
    let state = Arc::new(AppState::from_parts(config, endpoints, credentials, dispatcher));
    routes::create_router(state)
}

/// Test harness for end-to-end relay tests
///
/// This harness creates a complete test environment with:
/// - Mock upstream server (wiremock)
/// - Real HTTP dispatcher pointed at the mock
/// - Real app router with all middleware
///
/// # Example
///
/// ```ignore
/// let harness = RelayTestHarness::new().await;
/// harness.upstream.mock_generate_success(json!({"a": 1})).await;
///
/// let response = harness.server
///     .post("/api/generate")
///     .json(&test_data::relay_request("gemini", test_data::text_payload()))
///     .await;
/// ```
pub struct RelayTestHarness {
    pub server: TestServer,
    pub upstream: MockUpstream,
}

impl RelayTestHarness {
    /// Harness with the test credential configured
    pub async fn new() -> Self {
        Self::with_credential(StaticCredential::new(TEST_API_KEY)).await
    }

    /// Harness whose credential source yields nothing
    pub async fn without_credential() -> Self {
        Self::with_credential(StaticCredential::missing()).await
    }

    async fn with_credential(credential: StaticCredential) -> Self {
        let upstream = MockUpstream::start().await;
        let dispatcher: Arc<dyn Dispatch> =
            Arc::new(UpstreamDispatcher::new(reqwest::Client::new()));
        let app = build_app(&upstream.uri(), Arc::new(credential), dispatcher);
        let server = TestServer::new(app).expect("Failed to create test server");

        Self { server, upstream }
    }
}

/// Test server whose upstream is an in-process dispatcher
pub fn scripted_server(dispatcher: Arc<dyn Dispatch>) -> TestServer {
    let app = build_app(
        "http://upstream.invalid/v1beta",
        Arc::new(StaticCredential::new(TEST_API_KEY)),
        dispatcher,
    );
    TestServer::new(app).expect("Failed to create test server")
}
