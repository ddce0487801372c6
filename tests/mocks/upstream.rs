//! Mock generative-content upstream for testing
//!
//! Provides wiremock-based mocks for the endpoints in the built-in table:
//! - POST /models/{text-model}:generateContent - buffered text generation
//! - POST /models/{image-model}:predict - buffered image generation
//! - POST /models/{text-model}:streamGenerateContent?alt=sse - streamed generation
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::mocks::upstream::MockUpstream;
//!
//! #[tokio::test]
//! async fn test_with_upstream_mock() {
//!     let upstream = MockUpstream::start().await;
//!     upstream.mock_generate_success(json!({"a": 1})).await;
//!
//!     // Use upstream.uri() as RELAY_UPSTREAM_URL
//! }
//! ```

use serde_json::Value;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

/// Path of the buffered text generation target
pub const GENERATE_PATH: &str = "/models/gemini-2.5-flash-preview-05-20:generateContent";
/// Path of the buffered image generation target
pub const PREDICT_PATH: &str = "/models/imagen-3.0-generate-002:predict";
/// Path of the streamed text generation target
pub const STREAM_PATH: &str = "/models/gemini-2.5-flash-preview-05-20:streamGenerateContent";

/// Mock upstream server wrapper
pub struct MockUpstream {
    server: MockServer,
}

impl MockUpstream {
    /// Start a new mock upstream server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the mock server URI
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Access the underlying server for ad-hoc mocks
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    // =========================================================================
    // Buffered targets
    // =========================================================================

    /// Mock a successful buffered text generation that requires the test key
    pub async fn mock_generate_success(&self, body: Value) {
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", super::TEST_API_KEY))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mock a successful image generation
    pub async fn mock_predict_success(&self, body: Value) {
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .and(query_param("key", super::TEST_API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mock an upstream error with a raw text body
    pub async fn mock_generate_error(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mock a 200 whose body is not JSON
    pub async fn mock_generate_malformed(&self) {
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>gateway hiccup</html>")
                    .insert_header("content-type", "text/html"),
            )
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // Streamed target
    // =========================================================================

    /// Mock a streamed generation emitting `chunks` back to back
    pub async fn mock_stream(&self, chunks: &[&str]) {
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .and(query_param("alt", "sse"))
            .and(query_param("key", super::TEST_API_KEY))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(chunks.concat())
                    .insert_header("content-type", "text/event-stream"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a streamed target that rejects before sending any event
    pub async fn mock_stream_error(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(STREAM_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Requests received so far
    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}
