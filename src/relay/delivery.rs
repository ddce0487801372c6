//! Response relay
//!
//! Drives one invocation from dispatch to the caller-facing response and
//! owns the buffered/streamed decision. The delivery mode is fixed by the
//! resolved endpoint before the upstream call, never inferred from the
//! upstream response.
//!
//! Streamed delivery commits status and headers before the first upstream
//! byte is read. After that point an upstream failure cannot become a
//! structured error; the body stream yields an error instead, which makes
//! the server abort the caller's connection.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;

use crate::{
    endpoints::RelayMode,
    error::{RelayError, RelayResult},
    proxy::{Dispatch, RequestContext, UpstreamResponse},
    relay::ResolvedEndpoint,
    routes::metrics::{record_stream_chunk, record_stream_interrupted},
    streaming::Utf8ChunkDecoder,
};

/// Lifecycle of one relay invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Dispatched,
    BufferedDelivery,
    StreamingDelivery,
    Done,
    Failed,
}

impl RelayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayState::Idle => "idle",
            RelayState::Dispatched => "dispatched",
            RelayState::BufferedDelivery => "buffered_delivery",
            RelayState::StreamingDelivery => "streaming_delivery",
            RelayState::Done => "done",
            RelayState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayState::Done | RelayState::Failed)
    }

    /// Whether `next` is a legal successor of this state
    pub fn allows(&self, next: RelayState) -> bool {
        use RelayState::*;
        match (self, next) {
            (s, Failed) => !s.is_terminal(),
            (Idle, Dispatched) => true,
            (Dispatched, BufferedDelivery) | (Dispatched, StreamingDelivery) => true,
            (BufferedDelivery, Done) | (StreamingDelivery, Done) => true,
            _ => false,
        }
    }
}

/// Relays one upstream response to the caller
pub struct ResponseRelay {
    ctx: RequestContext,
    state: RelayState,
}

impl ResponseRelay {
    pub fn new(ctx: RequestContext) -> Self {
        Self {
            ctx,
            state: RelayState::Idle,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    fn transition(&mut self, next: RelayState) {
        debug_assert!(
            self.state.allows(next),
            "illegal relay transition {:?} -> {:?}",
            self.state,
            next
        );
        self.ctx.log_transition(self.state.as_str(), next.as_str());
        self.state = next;
    }

    /// Dispatch `payload` to `endpoint` and deliver the response.
    ///
    /// Every error returned from here happened before the commit point and
    /// is safe to report as a structured JSON error.
    pub async fn run(
        mut self,
        dispatcher: &dyn Dispatch,
        endpoint: &ResolvedEndpoint,
        payload: &Value,
    ) -> RelayResult<Response> {
        self.ctx.log_request_start();

        let upstream = match dispatcher.dispatch(endpoint, payload, &self.ctx).await {
            Ok(upstream) => upstream,
            Err(e) => return Err(self.fail(e)),
        };
        self.transition(RelayState::Dispatched);

        self.deliver(endpoint.mode, upstream).await
    }

    /// Deliver an already-dispatched upstream response in `mode`
    pub async fn deliver(
        mut self,
        mode: RelayMode,
        upstream: UpstreamResponse,
    ) -> RelayResult<Response> {
        if self.state == RelayState::Idle {
            self.transition(RelayState::Dispatched);
        }

        match mode {
            RelayMode::Buffered => {
                self.transition(RelayState::BufferedDelivery);
                match Self::read_buffered(upstream).await {
                    Ok((value, size)) => {
                        self.transition(RelayState::Done);
                        self.ctx.log_request_complete(size);
                        Ok((StatusCode::OK, Json(value)).into_response())
                    }
                    Err(e) => Err(self.fail(e)),
                }
            }
            RelayMode::Streamed => {
                self.transition(RelayState::StreamingDelivery);
                match self.stream_response(upstream) {
                    Ok(response) => Ok(response),
                    Err(e) => Err(self.fail(e)),
                }
            }
        }
    }

    fn fail(&mut self, error: RelayError) -> RelayError {
        self.transition(RelayState::Failed);
        self.ctx
            .log_error(error.kind(), &error.details().unwrap_or_else(|| error.to_string()));
        error
    }

    async fn read_buffered(upstream: UpstreamResponse) -> RelayResult<(Value, usize)> {
        let bytes = upstream.into_bytes().await?;
        let value: Value = serde_json::from_slice(&bytes)?;
        Ok((value, bytes.len()))
    }

    /// Commit streaming headers and hand the forwarding loop to the body
    fn stream_response(&self, upstream: UpstreamResponse) -> RelayResult<Response> {
        let ctx = self.ctx.clone();
        let mut chunks = upstream.body;

        let forwarded = async_stream::stream! {
            let mut decoder = Utf8ChunkDecoder::new();
            let mut forwarded_chunks = 0usize;
            let mut forwarded_bytes = 0usize;

            loop {
                match chunks.next().await {
                    Some(Ok(chunk)) => {
                        if chunk.is_empty() {
                            continue;
                        }
                        let text = decoder.decode(&chunk);
                        if text.is_empty() {
                            continue;
                        }
                        forwarded_chunks += 1;
                        forwarded_bytes += text.len();
                        record_stream_chunk(&ctx.target_id);
                        yield Ok::<Bytes, RelayError>(Bytes::from(text));
                    }
                    Some(Err(e)) => {
                        let reason = e.details().unwrap_or_else(|| e.to_string());
                        ctx.log_stream_interrupted(forwarded_chunks, forwarded_bytes, &reason);
                        ctx.log_transition(
                            RelayState::StreamingDelivery.as_str(),
                            RelayState::Failed.as_str(),
                        );
                        record_stream_interrupted(&ctx.target_id);
                        yield Err(RelayError::StreamInterrupted(reason));
                        break;
                    }
                    None => {
                        if decoder.has_pending() {
                            ctx.log_warning("upstream ended inside a multi-byte character");
                        }
                        let tail = decoder.finish();
                        if !tail.is_empty() {
                            forwarded_bytes += tail.len();
                            yield Ok(Bytes::from(tail));
                        }
                        ctx.log_stream_ended(forwarded_chunks, forwarded_bytes);
                        ctx.log_transition(
                            RelayState::StreamingDelivery.as_str(),
                            RelayState::Done.as_str(),
                        );
                        break;
                    }
                }
            }
        };

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::CONNECTION, "keep-alive")
            .header("X-Accel-Buffering", "no")
            .body(Body::from_stream(forwarded))
            .map_err(|e| RelayError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))?;

        self.ctx.log_stream_started();
        Ok(response)
    }
}
