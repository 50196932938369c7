//! Route gate middleware.
//!
//! Decides, before any handler runs, whether a request may proceed:
//!
//! ```text
//! static asset prefix            → pass
//! /api/* under a public prefix   → pass
//! /api/* without credential      → 401 {error: "Unauthorized"}
//! public page                    → pass
//! page without credential        → 307 /auth/sign-in?next=<path?query>
//! anything with a credential     → pass
//! ```
//!
//! Only presence of the credential is checked; validity is the upstream's call.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

use crate::config::AuthConfig;
use crate::http::error::GatewayError;
use crate::http::server::AppState;
use crate::security::credentials;

/// Outcome of the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Pass,
    Unauthorized,
    /// Send the browser to this location.
    SignIn(String),
}

/// `true` when `path` is `prefix` itself or lies beneath it.
fn under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_api(path: &str) -> bool {
    under(path, "/api")
}

/// Sign-in location carrying the original target in `next`.
pub fn sign_in_location(auth: &AuthConfig, path_and_query: &str) -> String {
    let next: String = form_urlencoded::byte_serialize(path_and_query.as_bytes()).collect();
    format!("{}?next={}", auth.sign_in_path, next)
}

/// Pure gate decision.
pub fn decide(auth: &AuthConfig, path: &str, query: Option<&str>, has_credential: bool) -> Decision {
    if auth.static_prefixes.iter().any(|p| under(path, p)) {
        return Decision::Pass;
    }

    if is_api(path) {
        if has_credential || auth.public_api_prefixes.iter().any(|p| under(path, p)) {
            return Decision::Pass;
        }
        return Decision::Unauthorized;
    }

    let page = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    if has_credential || auth.public_pages.iter().any(|p| p == page) {
        return Decision::Pass;
    }

    let target = match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    };
    Decision::SignIn(sign_in_location(auth, &target))
}

pub async fn auth_gate(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let auth = &state.config.auth;
    let has_credential = credentials::resolve(req.headers(), &auth.cookie_name).is_some();
    let path = req.uri().path().to_string();

    match decide(auth, &path, req.uri().query(), has_credential) {
        Decision::Pass => next.run(req).await,
        Decision::Unauthorized => {
            tracing::debug!(path = %path, "Rejected API call without credential");
            GatewayError::Unauthorized
                .into_envelope(state.config.mode())
                .into_response()
        }
        Decision::SignIn(location) => {
            tracing::debug!(path = %path, location = %location, "Redirecting to sign-in");
            match HeaderValue::from_str(&location) {
                Ok(value) => (
                    StatusCode::TEMPORARY_REDIRECT,
                    [(header::LOCATION, value)],
                )
                    .into_response(),
                Err(_) => StatusCode::BAD_REQUEST.into_response(),
            }
        }
    }
}
