//! Upstream dispatch
//!
//! Issues the single outbound call for an invocation and hands the response
//! over, status and headers awaited but body still unread, so the relay can
//! decide how to consume it.

use std::pin::Pin;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::error;

use crate::{
    error::{RelayError, RelayResult},
    proxy::{headers::build_upstream_headers, logging::RequestContext},
    relay::ResolvedEndpoint,
};

/// Lazy sequence of upstream body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RelayError>> + Send>>;

/// A successful upstream response whose body has not been consumed yet.
///
/// Owned by exactly one consumer; dropping it closes the upstream
/// connection.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl UpstreamResponse {
    /// Wrap a chunk producer as a 200 response
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, RelayError>> + Send + 'static,
    {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Box::pin(stream),
        }
    }

    /// Drain the whole body into memory
    pub async fn into_bytes(mut self) -> RelayResult<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

/// Performs the outbound call for a resolved endpoint
///
/// Implementations MUST:
/// - Send the payload verbatim, without injecting or reshaping fields
/// - Return [`RelayError::Upstream`] for a non-success status, with the
///   upstream body text as detail
/// - Return [`RelayError::Transport`] when no response could be obtained
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Get the dispatcher name for logging
    fn name(&self) -> &'static str;

    /// Send `payload` to `endpoint` and await the response head
    async fn dispatch(
        &self,
        endpoint: &ResolvedEndpoint,
        payload: &Value,
        ctx: &RequestContext,
    ) -> RelayResult<UpstreamResponse>;
}

/// HTTP dispatcher backed by a pooled `reqwest` client
pub struct UpstreamDispatcher {
    client: reqwest::Client,
}

impl UpstreamDispatcher {
    /// Create a new dispatcher
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Dispatch for UpstreamDispatcher {
    fn name(&self) -> &'static str {
        "upstream"
    }

    async fn dispatch(
        &self,
        endpoint: &ResolvedEndpoint,
        payload: &Value,
        ctx: &RequestContext,
    ) -> RelayResult<UpstreamResponse> {
        let body = serde_json::to_vec(payload).map_err(|e| {
            RelayError::Internal(anyhow::anyhow!("Failed to serialize payload: {}", e))
        })?;

        ctx.log_upstream_request(&endpoint.redacted_url(), body.len());

        let response = self
            .client
            .post(endpoint.url().clone())
            .headers(build_upstream_headers())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                let err = RelayError::from(e);
                error!(
                    trace_id = %ctx.trace_id,
                    url = %endpoint.redacted_url(),
                    error = %err.details().unwrap_or_default(),
                    "Failed to send request to upstream"
                );
                err
            })?;

        let status = response.status();
        ctx.log_upstream_response(status.as_u16(), response.content_length());

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RelayError::Upstream { status, body: text });
        }

        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(RelayError::from));

        Ok(UpstreamResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}
