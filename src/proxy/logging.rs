//! Request logging utilities for relay invocations
//!
//! Provides structured logging with correlation IDs so one invocation can be
//! followed from validation through the last forwarded chunk.

use std::time::Instant;
use tracing::{debug, error, info, warn, Span};
use uuid::Uuid;

use crate::endpoints::RelayMode;

/// Context for tracking one relay invocation
///
/// Provides correlation IDs and timing information for debugging
/// and observability.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this invocation (for log correlation)
    pub trace_id: String,
    /// When the invocation started
    pub start_time: Instant,
    /// Dispatcher handling this invocation
    pub dispatcher: String,
    /// Target identifier requested by the caller
    pub target_id: String,
    /// Delivery mode selected for the target
    pub mode: RelayMode,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(dispatcher: &str, target_id: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(), // Short ID for readability
            start_time: Instant::now(),
            dispatcher: dispatcher.to_string(),
            target_id: target_id.to_string(),
            mode: RelayMode::default(),
        }
    }

    /// Set the delivery mode
    pub fn with_mode(mut self, mode: RelayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Log invocation start
    pub fn log_request_start(&self) {
        info!(
            trace_id = %self.trace_id,
            dispatcher = %self.dispatcher,
            target = %self.target_id,
            mode = %self.mode.as_str(),
            "Relay request started"
        );
    }

    /// Log request being sent upstream (URL must already be redacted)
    pub fn log_upstream_request(&self, redacted_url: &str, body_size: usize) {
        debug!(
            trace_id = %self.trace_id,
            url = %redacted_url,
            body_size = %body_size,
            elapsed_ms = %self.elapsed_ms(),
            "Sending request to upstream"
        );
    }

    /// Log response status received from upstream
    pub fn log_upstream_response(&self, status: u16, content_length: Option<u64>) {
        info!(
            trace_id = %self.trace_id,
            target = %self.target_id,
            status = %status,
            content_length = ?content_length,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Log a relay state transition
    pub fn log_transition(&self, from: &str, to: &str) {
        debug!(
            trace_id = %self.trace_id,
            from = %from,
            to = %to,
            "Relay state transition"
        );
    }

    /// Log successful buffered completion
    pub fn log_request_complete(&self, body_size: usize) {
        info!(
            trace_id = %self.trace_id,
            target = %self.target_id,
            mode = %self.mode.as_str(),
            body_size = %body_size,
            elapsed_ms = %self.elapsed_ms(),
            "Relay request completed"
        );
    }

    /// Log stream committed (headers sent)
    pub fn log_stream_started(&self) {
        info!(
            trace_id = %self.trace_id,
            target = %self.target_id,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response started"
        );
    }

    /// Log stream ended cleanly
    pub fn log_stream_ended(&self, chunks: usize, bytes: usize) {
        info!(
            trace_id = %self.trace_id,
            target = %self.target_id,
            chunks = %chunks,
            bytes = %bytes,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response ended"
        );
    }

    /// Log an upstream read failure after the commit point
    pub fn log_stream_interrupted(&self, chunks: usize, bytes: usize, error: &str) {
        error!(
            trace_id = %self.trace_id,
            target = %self.target_id,
            chunks = %chunks,
            bytes = %bytes,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Upstream stream interrupted after commit, closing caller connection"
        );
    }

    /// Log a warning condition
    pub fn log_warning(&self, message: &str) {
        warn!(
            trace_id = %self.trace_id,
            target = %self.target_id,
            elapsed_ms = %self.elapsed_ms(),
            message = %message,
            "Warning during relay"
        );
    }

    /// Log a failure reported to the caller as a structured error
    pub fn log_error(&self, kind: &str, error: &str) {
        error!(
            trace_id = %self.trace_id,
            target = %self.target_id,
            mode = %self.mode.as_str(),
            kind = %kind,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Relay request failed"
        );
    }

    /// Create a tracing span for this invocation
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "relay",
            trace_id = %self.trace_id,
            target = %self.target_id,
            mode = %self.mode.as_str(),
        )
    }
}
