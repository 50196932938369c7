//! Upstream response normalization.
//!
//! The backend answers in one of a closed set of shapes:
//!
//! ```text
//! [ ... ]                                   bare array
//! { "data": T }                             data wrapper
//! { "success": true, "data": T, "timestamp": "..." }   API response wrapper
//! { ... }                                   bare object
//! ```
//!
//! Browsers always receive the canonical `T`. Anything outside that set is
//! rejected instead of guessed at.

use axum::http::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::http::error::{message_body, GatewayError};
use crate::proxy::client::UpstreamResponse;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Failed to parse upstream response: {0}")]
    InvalidJson(String),

    #[error("Unrecognized upstream response shape: {0}")]
    UnrecognizedShape(&'static str),
}

/// A parsed upstream body classified by envelope shape.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamShape {
    Array(Vec<Value>),
    /// `{data}` or `{success, data, timestamp}`; both unwrap the same way.
    Wrapped(Value),
    Bare(Map<String, Value>),
    /// Empty 2xx body.
    Empty,
}

impl UpstreamShape {
    pub fn classify(value: Value) -> Result<Self, NormalizeError> {
        match value {
            Value::Array(items) => Ok(UpstreamShape::Array(items)),
            Value::Object(mut map) => match map.remove("data") {
                Some(data) => Ok(UpstreamShape::Wrapped(data)),
                None => Ok(UpstreamShape::Bare(map)),
            },
            Value::Null => Ok(UpstreamShape::Empty),
            Value::String(_) => Err(NormalizeError::UnrecognizedShape("string")),
            Value::Number(_) => Err(NormalizeError::UnrecognizedShape("number")),
            Value::Bool(_) => Err(NormalizeError::UnrecognizedShape("boolean")),
        }
    }

    pub fn into_canonical(self) -> Value {
        match self {
            UpstreamShape::Array(items) => Value::Array(items),
            UpstreamShape::Wrapped(data) => data,
            UpstreamShape::Bare(map) => Value::Object(map),
            UpstreamShape::Empty => Value::Null,
        }
    }
}

/// Unwrap a parsed upstream body into the shape the browser expects.
pub fn normalize(body: Value) -> Result<Value, NormalizeError> {
    UpstreamShape::classify(body).map(UpstreamShape::into_canonical)
}

/// Parse raw body bytes; an empty (or whitespace) body is `null`.
pub fn parse_body(bytes: &[u8]) -> Result<Value, NormalizeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| NormalizeError::InvalidJson(e.to_string()))
}

/// Body of the error envelope for a non-2xx upstream response.
///
/// JSON error bodies pass through untouched; anything else is wrapped as
/// `{"message": text}` so the browser always gets JSON.
pub fn error_payload(status: StatusCode, text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return message_body(status.canonical_reason().unwrap_or("Upstream request failed"));
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) if value.is_object() || value.is_array() => value,
        _ => message_body(trimmed),
    }
}

/// Turn a buffered upstream response into the canonical value, or into the
/// error that carries the upstream status through.
pub fn unwrap_response(response: &UpstreamResponse) -> Result<Value, GatewayError> {
    if !response.is_success() {
        return Err(GatewayError::Upstream {
            status: response.status,
            body: error_payload(response.status, &response.text()),
        });
    }

    let parsed = parse_body(&response.body)?;
    normalize(parsed).map_err(|err| {
        tracing::warn!(error = %err, "Rejected upstream response");
        GatewayError::from(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::HeaderMap;
    use serde_json::json;

    fn response(status: u16, body: &'static str) -> UpstreamResponse {
        UpstreamResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_array_is_unchanged() {
        let v = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(normalize(v.clone()).unwrap(), v);
    }

    #[test]
    fn test_data_wrapper_is_unwrapped() {
        assert_eq!(normalize(json!({"data": [1, 2]})).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_api_response_wrapper_is_unwrapped() {
        let body = json!({
            "success": true,
            "data": {"count": 5},
            "timestamp": "2025-01-01T00:00:00Z"
        });
        assert_eq!(normalize(body).unwrap(), json!({"count": 5}));
    }

    #[test]
    fn test_bare_object_is_itself() {
        let v = json!({"id": "x", "name": "y"});
        assert_eq!(normalize(v.clone()).unwrap(), v);
    }

    #[test]
    fn test_null_data_unwraps_to_null() {
        assert_eq!(normalize(json!({"success": true, "data": null})).unwrap(), Value::Null);
    }

    #[test]
    fn test_scalars_are_rejected() {
        assert_eq!(
            normalize(json!("ok")).unwrap_err(),
            NormalizeError::UnrecognizedShape("string")
        );
        assert!(normalize(json!(5)).is_err());
        assert!(normalize(json!(true)).is_err());
    }

    #[test]
    fn test_non_json_error_body_is_wrapped() {
        let err = unwrap_response(&response(404, "not found")).unwrap_err();
        match err {
            GatewayError::Upstream { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, json!({"message": "not found"}));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_error_body_passes_through() {
        let err = unwrap_response(&response(409, r#"{"message":"dup","code":"X"}"#)).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Upstream { body, .. } if body == json!({"message": "dup", "code": "X"})
        ));
    }

    #[test]
    fn test_empty_error_body_uses_reason() {
        assert_eq!(
            error_payload(StatusCode::FORBIDDEN, ""),
            json!({"message": "Forbidden"})
        );
    }

    #[test]
    fn test_empty_success_body_is_null() {
        assert_eq!(unwrap_response(&response(200, "")).unwrap(), Value::Null);
    }

    #[test]
    fn test_garbage_success_body_is_gateway_error() {
        let err = unwrap_response(&response(200, "<html>")).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
