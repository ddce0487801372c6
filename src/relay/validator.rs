//! Inbound request validation
//!
//! Checks the method and the two required body fields. Pure: no I/O, no
//! side effects.

use axum::http::Method;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{RelayError, RelayResult};

/// The caller's request as received, before any checks
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub body: Bytes,
}

/// Wire shape of the inbound body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    #[serde(default, alias = "targetApi")]
    target_id: Option<String>,
    #[serde(default)]
    payload: Option<Value>,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub target_id: String,
    /// Opaque upstream payload, forwarded verbatim
    pub payload: Value,
}

/// Validates inbound requests
pub struct RequestValidator;

impl RequestValidator {
    /// Validate method and required fields.
    ///
    /// The method is checked first: a non-POST request is rejected with
    /// 405 whatever its body contains.
    pub fn validate(request: &InboundRequest) -> RelayResult<ValidatedRequest> {
        if request.method != Method::POST {
            return Err(RelayError::MethodNotAllowed);
        }

        let body: GenerateBody = if request.body.iter().all(u8::is_ascii_whitespace) {
            GenerateBody::default()
        } else {
            parse_body(&request.body)?
        };

        let target_id = body
            .target_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let payload = body.payload.filter(|p| !is_empty_value(p));

        match (target_id, payload) {
            (Some(target_id), Some(payload)) => Ok(ValidatedRequest { target_id, payload }),
            (target_id, payload) => {
                let missing: Vec<&str> = [
                    target_id.is_none().then_some("targetId"),
                    payload.is_none().then_some("payload"),
                ]
                .into_iter()
                .flatten()
                .collect();
                Err(RelayError::validation(format!(
                    "Missing required field(s): {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

fn parse_body(raw: &[u8]) -> RelayResult<GenerateBody> {
    let invalid = |details: String| RelayError::Validation {
        message: "Invalid request body".to_string(),
        details: Some(details),
    };

    let value: Value = serde_json::from_slice(raw).map_err(|e| invalid(e.to_string()))?;
    if !value.is_object() {
        return Err(invalid(format!("found {}", json_type(&value))));
    }
    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `null`, `""`, `{}` and `[]` count as absent
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
