//! Response envelope construction.
//!
//! # Responsibilities
//! - Tag every JSON response with its provenance (`x-mode`)
//! - Mark every response uncacheable
//! - Provide the canonical error bodies shared by all routes
//!
//! # Design Decisions
//! - Happy-path and error-path responses share one shape so browser-side
//!   error handling is uniform regardless of which route failed
//! - Mode travels in a header, leaving the JSON body exactly what the
//!   browser consumes

use std::fmt;

use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::error::{GatewayError, GatewayResult};

/// Header carrying the provenance of a response.
pub const X_MODE: HeaderName = HeaderName::from_static("x-mode");

/// Where a response's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// In-process fixtures.
    Mock,
    /// The upstream backend.
    Real,
    /// Fixtures served because the upstream was unreachable.
    Fallback,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Mock => "mock",
            Mode::Real => "real",
            Mode::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The uniform `{status, mode, body}` response every handler returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub status: StatusCode,
    pub mode: Mode,
    pub body: Value,
}

impl Envelope {
    pub fn new(status: StatusCode, mode: Mode, body: Value) -> Self {
        Self { status, mode, body }
    }

    pub fn ok(mode: Mode, body: Value) -> Self {
        Self::new(StatusCode::OK, mode, body)
    }

    pub fn created(mode: Mode, body: Value) -> Self {
        Self::new(StatusCode::CREATED, mode, body)
    }

    /// Serialize any value into an envelope body.
    pub fn json<T: Serialize>(status: StatusCode, mode: Mode, value: &T) -> GatewayResult<Self> {
        Ok(Self::new(status, mode, to_body(value)?))
    }

    /// 204 responses carry no body on the wire.
    pub fn no_content(mode: Mode) -> Self {
        Self::new(StatusCode::NO_CONTENT, mode, Value::Null)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let mut response = if self.status == StatusCode::NO_CONTENT {
            self.status.into_response()
        } else {
            (self.status, Json(self.body)).into_response()
        };
        stamp(&mut response, self.mode);
        response
    }
}

/// Serialize `value` into a JSON body. A value serde cannot represent
/// (e.g. a map with non-string keys) is an internal error, never `null`.
pub fn to_body<T: Serialize>(value: &T) -> GatewayResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| GatewayError::Internal(format!("Failed to serialize body: {err}")))
}

/// Attach the provenance and no-store headers to any response.
pub fn stamp(response: &mut Response, mode: Mode) {
    let headers = response.headers_mut();
    headers.insert(X_MODE, HeaderValue::from_static(mode.as_str()));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
}

/// Payload rendered by the browser's alert component for uncaught failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialog {
    pub variant: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub primary_action_label: &'static str,
}

/// Every uncaught failure renders with this dialog, whatever its origin.
pub const ERROR_DIALOG: Dialog = Dialog {
    variant: "error",
    title: "Something went wrong",
    description: "An unexpected error occurred. Please try again later.",
    primary_action_label: "OK",
};

/// Body of an uncaught-failure response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub dialog: Dialog,
}

pub fn error_body(message: impl Into<String>) -> Value {
    json!(ErrorBody {
        error: message.into(),
        dialog: ERROR_DIALOG,
    })
}

/// `{ "error": message }`, the body of every handled failure.
pub fn error_message(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}
