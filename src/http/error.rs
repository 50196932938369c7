//! Error taxonomy for route handlers.

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::fixtures::FixtureError;
use crate::http::response::{error_body, error_message, Envelope, Mode};
use crate::proxy::client::TransportError;
use crate::proxy::normalize::NormalizeError;

/// Everything a handler can fail with.
///
/// The first group is "handled": the handler detected the condition itself and
/// the response is a plain `{error}` envelope. The rest are unexpected and go
/// through the error boundary, which logs them and adds the dialog payload.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No credential where one is required.
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed input, detected before any upstream or fixture interaction.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Non-2xx upstream response, passed through with its status.
    #[error("upstream responded with {status}")]
    Upstream { status: StatusCode, body: Value },

    /// The upstream could not be reached at all.
    #[error("Upstream request failed: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("{0}")]
    Internal(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        GatewayError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        GatewayError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::Transport(_) | GatewayError::Normalize(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the handler anticipated this failure.
    pub fn is_handled(&self) -> bool {
        !matches!(
            self,
            GatewayError::Transport(_) | GatewayError::Normalize(_) | GatewayError::Internal(_)
        )
    }

    /// Render as an envelope. Unhandled errors get the dialog payload.
    pub fn into_envelope(self, mode: Mode) -> Envelope {
        let status = self.status();
        let body = match self {
            GatewayError::Upstream { body, .. } => body,
            GatewayError::Internal(message) if message.trim().is_empty() => {
                error_body("Internal Server Error")
            }
            err if err.is_handled() => error_message(err.to_string()),
            err => error_body(err.to_string()),
        };
        Envelope::new(status, mode, body)
    }
}

impl From<FixtureError> for GatewayError {
    fn from(err: FixtureError) -> Self {
        match err {
            FixtureError::NotFound(msg) => GatewayError::NotFound(msg),
            FixtureError::Invalid(msg) => GatewayError::BadRequest(msg),
            FixtureError::Conflict(msg) => GatewayError::Conflict(msg),
        }
    }
}

/// Wrap an upstream error body whose text could not be parsed as JSON.
pub fn message_body(text: &str) -> Value {
    json!({ "message": text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_body() {
        let env = GatewayError::Unauthorized.into_envelope(Mode::Real);
        assert_eq!(env.status, StatusCode::UNAUTHORIZED);
        assert_eq!(env.body, json!({"error": "Unauthorized"}));
    }

    #[test]
    fn test_upstream_body_is_passed_through() {
        let env = GatewayError::Upstream {
            status: StatusCode::NOT_FOUND,
            body: message_body("not found"),
        }
        .into_envelope(Mode::Real);
        assert_eq!(env.status, StatusCode::NOT_FOUND);
        assert_eq!(env.body, json!({"message": "not found"}));
    }

    #[test]
    fn test_internal_gets_dialog_and_fallback_message() {
        let env = GatewayError::Internal(String::new()).into_envelope(Mode::Mock);
        assert_eq!(env.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(env.body["error"], "Internal Server Error");
        assert_eq!(env.body["dialog"]["variant"], "error");
    }

    #[test]
    fn test_fixture_errors_map_to_handled_statuses() {
        let err: GatewayError = FixtureError::Conflict("dup".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.is_handled());
    }
}
