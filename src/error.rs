//! Error types for Genrelay
//!
//! Every failure an invocation can hit before the commit point is a
//! [`RelayError`] and renders as exactly one `{message, details}` JSON body.
//! [`RelayError::StreamInterrupted`] only ever surfaces as a body error after
//! streaming headers were flushed, which aborts the caller's connection.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Relay errors
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Only POST requests are allowed")]
    MethodNotAllowed,

    #[error("{message}")]
    Validation {
        message: String,
        details: Option<String>,
    },

    #[error("API key is not configured on the server.")]
    Configuration,

    #[error("Invalid target API specified: {0}")]
    UnknownTarget(String),

    #[error("Upstream API error")]
    Upstream { status: StatusCode, body: String },

    #[error("An error occurred while fetching from the upstream API.")]
    Transport(String),

    #[error("Upstream returned a malformed response body")]
    ResponseParse(#[from] serde_json::Error),

    #[error("Upstream stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RelayError {
    /// Shorthand for a 400 without diagnostic detail
    pub fn validation(message: impl Into<String>) -> Self {
        RelayError::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::Validation { .. } | RelayError::UnknownTarget(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Upstream { status, .. } => *status,
            RelayError::Configuration
            | RelayError::Transport(_)
            | RelayError::ResponseParse(_)
            | RelayError::StreamInterrupted(_)
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Diagnostic text placed in the `details` field, if any
    pub fn details(&self) -> Option<String> {
        match self {
            RelayError::MethodNotAllowed
            | RelayError::Configuration
            | RelayError::UnknownTarget(_) => None,
            RelayError::Validation { details, .. } => details.clone(),
            RelayError::Upstream { body, .. } => Some(body.clone()),
            RelayError::Transport(text) | RelayError::StreamInterrupted(text) => {
                Some(text.clone())
            }
            RelayError::ResponseParse(e) => Some(e.to_string()),
            RelayError::Internal(e) => Some(format!("{:#}", e)),
        }
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MethodNotAllowed => "method_not_allowed",
            RelayError::Validation { .. } => "validation_error",
            RelayError::Configuration => "configuration_error",
            RelayError::UnknownTarget(_) => "unknown_target",
            RelayError::Upstream { .. } => "upstream_error",
            RelayError::Transport(_) => "transport_error",
            RelayError::ResponseParse(_) => "response_parse_error",
            RelayError::StreamInterrupted(_) => "stream_interrupted",
            RelayError::Internal(_) => "internal_error",
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        // The URL carries the credential; never surface it
        RelayError::Transport(error_chain(&e.without_url()))
    }
}

/// Render an error and its sources as one line
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut text = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&RelayError> for ErrorResponse {
    fn from(e: &RelayError) -> Self {
        Self {
            message: e.to_string(),
            details: e.details(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Result type alias for convenience
pub type RelayResult<T> = Result<T, RelayError>;
