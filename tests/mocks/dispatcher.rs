//! Scripted in-process dispatcher
//!
//! Replaces the HTTP dispatcher with a producer whose chunks and failures are
//! fixed up front, so mid-stream behavior can be exercised without timing
//! games against a real socket.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use serde_json::Value;

use genrelay::{
    proxy::{Dispatch, RequestContext, UpstreamResponse},
    relay::ResolvedEndpoint,
    RelayError, RelayResult,
};

/// One step of the scripted upstream body
#[derive(Debug, Clone)]
pub enum Step {
    Chunk(&'static str),
    Fail(&'static str),
}

/// Dispatcher that replays a fixed script
pub struct ScriptedDispatcher {
    steps: Vec<Step>,
    reject: Option<(StatusCode, &'static str)>,
    calls: AtomicUsize,
}

impl ScriptedDispatcher {
    /// Upstream answers 200 and then plays `steps`
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            reject: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Upstream answers with a non-success status before any body
    pub fn rejecting(status: StatusCode, body: &'static str) -> Self {
        Self {
            steps: Vec::new(),
            reject: Some((status, body)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of dispatches performed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dispatch for ScriptedDispatcher {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn dispatch(
        &self,
        _endpoint: &ResolvedEndpoint,
        _payload: &Value,
        _ctx: &RequestContext,
    ) -> RelayResult<UpstreamResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some((status, body)) = self.reject {
            return Err(RelayError::Upstream {
                status,
                body: body.to_string(),
            });
        }

        let items: Vec<Result<Bytes, RelayError>> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Chunk(text) => Ok(Bytes::from_static(text.as_bytes())),
                Step::Fail(reason) => Err(RelayError::Transport(reason.to_string())),
            })
            .collect();

        Ok(UpstreamResponse::from_stream(futures::stream::iter(items)))
    }
}
