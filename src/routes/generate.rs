//! Generate endpoint
//!
//! Accepts `{targetId, payload}`, injects the server-held credential and
//! relays the upstream response back, buffered or streamed depending on
//! the target.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::Method,
    response::Response,
};
use tracing::{info, warn, Instrument};

use crate::{
    error::{RelayError, RelayResult},
    proxy::RequestContext,
    relay::{EndpointResolver, InboundRequest, RequestValidator, ResponseRelay},
    routes::metrics::record_request,
    AppState,
};

/// Metrics label used before a target is known
const UNRESOLVED_TARGET: &str = "-";

/// Handle a relay request
///
/// Registered for every method so that a wrong method gets the JSON 405
/// rather than the router's bare rejection.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    method: Method,
    request: Request,
) -> Result<Response, RelayError> {
    let start_time = Instant::now();
    let mut target = UNRESOLVED_TARGET.to_string();

    let result = handle(&state, method, request, &mut target).await;

    let duration = start_time.elapsed().as_secs_f64();
    match &result {
        Ok(response) => {
            record_request("success", &target, duration);
            info!(
                target_id = %target,
                status = %response.status(),
                duration_ms = %format!("{:.2}", duration * 1000.0),
                "Relay response head sent"
            );
        }
        Err(e) => {
            record_request(e.kind(), &target, duration);
            warn!(
                target_id = %target,
                status = %e.status(),
                kind = %e.kind(),
                error = %e,
                "Relay request rejected"
            );
        }
    }

    result
}

async fn handle(
    state: &AppState,
    method: Method,
    request: Request,
    target: &mut String,
) -> RelayResult<Response> {
    // Reject the method before touching the body
    if method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }

    let body = axum::body::to_bytes(request.into_body(), state.config.max_body_bytes)
        .await
        .map_err(|e| RelayError::Validation {
            message: "Failed to read request body".to_string(),
            details: Some(e.to_string()),
        })?;

    let validated = RequestValidator::validate(&InboundRequest { method, body })?;
    *target = validated.target_id.clone();

    let credential = state.credentials.credential();
    let endpoint = EndpointResolver::new(&state.endpoints)
        .resolve(&validated.target_id, credential.as_deref())?;

    let ctx = RequestContext::new(state.dispatcher.name(), &endpoint.target_id)
        .with_mode(endpoint.mode);
    let span = ctx.create_span();

    ResponseRelay::new(ctx)
        .run(state.dispatcher.as_ref(), &endpoint, &validated.payload)
        .instrument(span)
        .await
}
