//! Session cookie lifecycle: login, token callback, logout.
//!
//! # Responsibilities
//! - Issue the credential cookie after a successful login or token callback
//! - Clear it on logout
//! - Finish browser-based sign-in with a redirect to a same-site target
//!
//! # Design Decisions
//! - The cookie is only attached when the handler succeeded
//! - `next` targets must be same-site paths; anything else falls back to
//!   the configured default redirect

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::AuthConfig;
use crate::http::boundary::guard;
use crate::http::error::GatewayError;
use crate::http::extract::Query;
use crate::http::response::{Envelope, Mode};
use crate::http::server::AppState;
use crate::proxy::{pipeline, Caller, UpstreamRequest};
use crate::routes::{parse_json, required};
use crate::security::credentials::Credential;
use crate::security::gate::sign_in_location;

/// Token handed out by the mock login.
pub const MOCK_ACCESS_TOKEN: &str = "mock-access-token";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/callback", post(accept_token))
        .route("/api/auth/logout", post(logout))
        .route("/auth/callback", get(callback_page))
}

/// The credential cookie as the browser should store it.
pub fn session_cookie(auth: &AuthConfig, credential: &Credential) -> Cookie<'static> {
    Cookie::build((auth.cookie_name.clone(), credential.token().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.secure_cookie)
        .max_age(time::Duration::seconds(auth.cookie_max_age_secs))
        .build()
}

/// Attach the cookie for `issued`, if any, to `response`.
fn with_session(
    jar: CookieJar,
    auth: &AuthConfig,
    issued: Option<Credential>,
    response: Response,
) -> Response {
    match issued {
        Some(credential) => (jar.add(session_cookie(auth, &credential)), response).into_response(),
        None => response,
    }
}

/// Accept only same-site absolute paths as a post-login target.
pub fn safe_next<'a>(next: Option<&'a str>, default: &'a str) -> &'a str {
    match next.map(str::trim) {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => default,
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Pull the access token out of a login response body.
fn access_token(body: &Value) -> Option<Credential> {
    ["accessToken", "access_token", "token"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .and_then(Credential::new)
}

async fn login(
    State(state): State<AppState>,
    caller: Caller,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    let mut issued = None;
    let response = guard("api/auth/login", state.mode(), async {
        let request: LoginRequest = parse_json(&body)?;
        let email = required(Some(request.email.as_str()), "Email and password are required")?;
        required(Some(request.password.as_str()), "Email and password are required")?;

        if state.is_mock() {
            let credential = Credential::new(MOCK_ACCESS_TOKEN)
                .ok_or_else(|| GatewayError::Internal("mock token is blank".into()))?;
            let profile = state.fixtures.profile.get(None);
            issued = Some(credential);
            return Ok(Envelope::ok(
                Mode::Mock,
                json!({ "accessToken": MOCK_ACCESS_TOKEN, "email": email, "user": profile }),
            ));
        }

        let upstream = UpstreamRequest::post("/api/auth/login").json(json!({
            "email": email,
            "password": request.password,
        }));
        let envelope = pipeline::forward_json(state.upstream.as_ref(), &caller, upstream).await?;
        let credential = access_token(&envelope.body).ok_or_else(|| {
            GatewayError::Internal("Login response did not include an access token".into())
        })?;
        issued = Some(credential);
        Ok(envelope)
    })
    .await;

    with_session(jar, &state.config.auth, issued, response)
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    token: Option<String>,
}

/// `POST /api/auth/callback {token}` stores an externally obtained token.
async fn accept_token(State(state): State<AppState>, jar: CookieJar, body: Bytes) -> Response {
    let mode = state.mode();
    let mut issued = None;
    let response = guard("api/auth/callback", mode, async {
        let request: TokenRequest = parse_json(&body)?;
        let credential = request
            .token
            .and_then(Credential::new)
            .ok_or_else(|| GatewayError::bad_request("Missing token"))?;
        issued = Some(credential);
        Ok(Envelope::ok(mode, json!({ "ok": true })))
    })
    .await;

    with_session(jar, &state.config.auth, issued, response)
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mode = state.mode();
    let response = guard("api/auth/logout", mode, async move {
        Ok(Envelope::ok(mode, json!({ "ok": true })))
    })
    .await;

    let removal = Cookie::build(state.config.auth.cookie_name.clone()).path("/");
    (jar.remove(removal), response).into_response()
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    token: Option<String>,
    next: Option<String>,
}

/// Browser landing page of an external sign-in: store the token and move on.
async fn callback_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let auth = &state.config.auth;
    match query.token.and_then(Credential::new) {
        Some(credential) => {
            let target = safe_next(query.next.as_deref(), &auth.default_redirect);
            tracing::debug!(target = %target, "Sign-in callback accepted");
            (jar.add(session_cookie(auth, &credential)), Redirect::to(target)).into_response()
        }
        None => {
            tracing::debug!("Sign-in callback without token");
            let target = safe_next(query.next.as_deref(), &auth.default_redirect);
            Redirect::to(&sign_in_location(auth, target)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("/documents?id=1"), "/dashboard"), "/documents?id=1");
        assert_eq!(safe_next(Some("//evil.example"), "/dashboard"), "/dashboard");
        assert_eq!(safe_next(Some("https://evil.example"), "/dashboard"), "/dashboard");
        assert_eq!(safe_next(Some("/\\evil.example"), "/dashboard"), "/dashboard");
        assert_eq!(safe_next(None, "/dashboard"), "/dashboard");
    }

    #[test]
    fn test_session_cookie_attributes() {
        let auth = AuthConfig::default();
        let credential = Credential::new("abc").unwrap();
        let cookie = session_cookie(&auth, &credential).to_string();
        assert!(cookie.starts_with("access_token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn test_access_token_accepts_common_keys() {
        assert_eq!(
            access_token(&json!({"accessToken": "t1"})).map(|c| c.token().to_string()),
            Some("t1".into())
        );
        assert_eq!(
            access_token(&json!({"token": "t2"})).map(|c| c.token().to_string()),
            Some("t2".into())
        );
        assert!(access_token(&json!({"accessToken": ""})).is_none());
    }
}
