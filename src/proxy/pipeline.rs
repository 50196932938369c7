//! The proxy pipeline shared by every real-mode route.
//!
//! ```text
//! resolve caller → prepare UpstreamRequest → Upstream::execute
//!     → normalize::unwrap_response → Envelope
//! ```
//!
//! Each stage is a plain function so it can be exercised on its own.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, HeaderName, HeaderValue, StatusCode},
};
use serde_json::{json, Value};

use crate::http::error::{GatewayError, GatewayResult};
use crate::http::request::X_REQUEST_ID;
use crate::http::response::{Envelope, Mode};
use crate::http::server::AppState;
use crate::proxy::client::{TransportError, Upstream, UpstreamRequest, UpstreamResponse};
use crate::proxy::normalize::{parse_body, unwrap_response};
use crate::security::credentials::{self, Credential};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Who is calling: credential plus the request metadata forwarded upstream.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub credential: Option<Credential>,
    pub request_id: Option<HeaderValue>,
    pub forwarded_for: Option<HeaderValue>,
}

impl Caller {
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        let forwarded_for = headers
            .get(&X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(|v| HeaderValue::from_str(v).ok());

        Self {
            credential: credentials::resolve(headers, cookie_name),
            request_id: headers.get(&X_REQUEST_ID).cloned(),
            forwarded_for,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// The credential, or `401` before anything is sent upstream.
    pub fn require(&self) -> GatewayResult<&Credential> {
        self.credential.as_ref().ok_or(GatewayError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for Caller
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let mut caller = Caller::from_headers(&parts.headers, &app.config.auth.cookie_name);

        if caller.forwarded_for.is_none() {
            caller.forwarded_for = parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .and_then(|ConnectInfo(addr)| HeaderValue::from_str(&addr.ip().to_string()).ok());
        }
        Ok(caller)
    }
}

/// Attach the caller's credential and tracing headers.
pub fn prepare(request: UpstreamRequest, caller: &Caller) -> UpstreamRequest {
    let mut request = request.bearer(caller.credential());
    if let Some(id) = &caller.request_id {
        request = request.header(X_REQUEST_ID, id.clone());
    }
    if let Some(ip) = &caller.forwarded_for {
        request = request.header(X_FORWARDED_FOR, ip.clone());
    }
    request
}

/// Execute one upstream call for `caller`.
pub async fn forward(
    upstream: &dyn Upstream,
    caller: &Caller,
    request: UpstreamRequest,
) -> GatewayResult<UpstreamResponse> {
    let request = prepare(request, caller);
    let method = request.method.clone();
    let path = request.segments.join("/");

    match upstream.execute(request).await {
        Ok(response) => {
            if response.status.is_server_error() {
                tracing::warn!(%method, path = %path, status = %response.status, "Upstream server error");
            }
            Ok(response)
        }
        Err(err) => {
            tracing::error!(%method, path = %path, error = %err, "Upstream unreachable");
            Err(GatewayError::Transport(err))
        }
    }
}

/// Normalize a buffered response into a real-mode envelope.
pub fn into_envelope(response: &UpstreamResponse) -> GatewayResult<Envelope> {
    if response.status == StatusCode::NO_CONTENT {
        return Ok(Envelope::no_content(Mode::Real));
    }
    let body = unwrap_response(response)?;
    Ok(Envelope::new(response.status, Mode::Real, body))
}

/// Message carried by a successful reply that may be plain text, a JSON
/// string, or a JSON object with a `message` field.
pub fn reply_message(response: &UpstreamResponse, default: &str) -> String {
    let text = response.text();
    let text = text.trim();
    if text.is_empty() {
        return default.to_string();
    }
    match parse_body(text.as_bytes()) {
        Ok(Value::String(message)) => message,
        Ok(value) => value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string(),
        Err(_) => text.to_string(),
    }
}

/// `{message}` from a reply that may not be JSON at all. Non-2xx replies keep
/// their upstream status and error body.
pub fn message_envelope(response: &UpstreamResponse, default: &str) -> GatewayResult<Envelope> {
    if !response.is_success() {
        unwrap_response(response)?;
    }
    Ok(Envelope::new(
        response.status,
        Mode::Real,
        json!({ "message": reply_message(response, default) }),
    ))
}

/// Forward a command whose upstream answers with a bare text message.
pub async fn forward_message(
    upstream: &dyn Upstream,
    caller: &Caller,
    request: UpstreamRequest,
    default: &str,
) -> GatewayResult<Envelope> {
    let response = forward(upstream, caller, request).await?;
    message_envelope(&response, default)
}

/// The whole pipeline: forward, normalize, envelope.
pub async fn forward_json(
    upstream: &dyn Upstream,
    caller: &Caller,
    request: UpstreamRequest,
) -> GatewayResult<Envelope> {
    let response = forward(upstream, caller, request).await?;
    into_envelope(&response)
}

/// Like [`forward_json`], but answers from `fallback` when the upstream cannot
/// be reached at all and fallback is enabled. Upstream HTTP errors are never
/// replaced.
pub async fn forward_json_or<F>(
    upstream: &dyn Upstream,
    caller: &Caller,
    request: UpstreamRequest,
    fallback_enabled: bool,
    fallback: F,
) -> GatewayResult<Envelope>
where
    F: FnOnce() -> GatewayResult<Value>,
{
    match forward_json(upstream, caller, request).await {
        Err(GatewayError::Transport(err)) if fallback_enabled => {
            tracing::warn!(error = %err, "Serving fixture fallback");
            Ok(Envelope::ok(Mode::Fallback, fallback()?))
        }
        other => other,
    }
}

/// Map a transport failure on a streaming call the same way as buffered ones.
pub fn transport(err: TransportError) -> GatewayError {
    tracing::error!(error = %err, "Upstream stream unreachable");
    GatewayError::Transport(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::client::{UpstreamStream, TransportError};
    use axum::body::Bytes;
    use axum::http::header;
    use futures_util::future::{BoxFuture, FutureExt};
    use std::sync::Mutex;

    /// Records requests and answers with a canned response.
    struct Canned {
        seen: Mutex<Vec<UpstreamRequest>>,
        reply: Result<(u16, &'static str), TransportError>,
    }

    impl Canned {
        fn new(reply: Result<(u16, &'static str), TransportError>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                reply,
            }
        }
    }

    impl Upstream for Canned {
        fn execute(
            &self,
            request: UpstreamRequest,
        ) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>> {
            self.seen.lock().unwrap().push(request);
            let reply = self.reply.clone().map(|(status, body)| UpstreamResponse {
                status: StatusCode::from_u16(status).unwrap(),
                headers: HeaderMap::new(),
                body: Bytes::from_static(body.as_bytes()),
            });
            async move { reply }.boxed()
        }

        fn stream(
            &self,
            _request: UpstreamRequest,
        ) -> BoxFuture<'_, Result<UpstreamStream, TransportError>> {
            async { Err(TransportError::Request("not streaming".into())) }.boxed()
        }
    }

    fn caller_with_token() -> Caller {
        Caller {
            credential: Credential::new("tok"),
            request_id: Some(HeaderValue::from_static("req-1")),
            forwarded_for: Some(HeaderValue::from_static("10.0.0.1")),
        }
    }

    #[tokio::test]
    async fn test_forward_attaches_credential_and_ids() {
        let upstream = Canned::new(Ok((200, r#"{"success":true,"data":{"count":5},"timestamp":"t"}"#)));
        let env = forward_json(
            &upstream,
            &caller_with_token(),
            UpstreamRequest::get("/api/notifications/unread-count"),
        )
        .await
        .unwrap();

        assert_eq!(env.body, json!({"count": 5}));
        assert_eq!(env.mode, Mode::Real);

        let seen = upstream.seen.lock().unwrap();
        let headers = seen[0].outbound_headers();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[&X_REQUEST_ID], "req-1");
        assert_eq!(headers[&X_FORWARDED_FOR], "10.0.0.1");
    }

    #[tokio::test]
    async fn test_upstream_status_is_preserved() {
        let upstream = Canned::new(Ok((201, r#"{"data":{"id":"n1"}}"#)));
        let env = forward_json(&upstream, &Caller::default(), UpstreamRequest::post("/api/x"))
            .await
            .unwrap();
        assert_eq!(env.status, StatusCode::CREATED);
        assert_eq!(env.body, json!({"id": "n1"}));
    }

    #[tokio::test]
    async fn test_fallback_only_on_transport_failure() {
        let down = Canned::new(Err(TransportError::Connect("refused".into())));
        let env = forward_json_or(
            &down,
            &Caller::default(),
            UpstreamRequest::get("/api/profile"),
            true,
            || Ok(json!({"id": "fixture"})),
        )
        .await
        .unwrap();
        assert_eq!(env.mode, Mode::Fallback);
        assert_eq!(env.body["id"], "fixture");

        let failing = Canned::new(Ok((500, "boom")));
        let err = forward_json_or(
            &failing,
            &Caller::default(),
            UpstreamRequest::get("/api/profile"),
            true,
            || Ok(json!({})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_transport_failure_without_fallback_propagates() {
        let down = Canned::new(Err(TransportError::Timeout("30s".into())));
        let err = forward_json(&down, &Caller::default(), UpstreamRequest::get("/api/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(TransportError::Timeout(_))));
    }

    fn reply(status: u16, body: &'static str) -> UpstreamResponse {
        UpstreamResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_reply_message_handles_text_and_json() {
        assert_eq!(reply_message(&reply(200, ""), "fallback"), "fallback");
        assert_eq!(reply_message(&reply(200, "OTP sent"), "fallback"), "OTP sent");
        assert_eq!(reply_message(&reply(200, r#""quoted""#), "fallback"), "quoted");
        assert_eq!(
            reply_message(&reply(200, r#"{"message":"done"}"#), "fallback"),
            "done"
        );
    }

    #[test]
    fn test_failed_reply_keeps_upstream_status() {
        let err = message_envelope(&reply(429, "slow down"), "fallback").unwrap_err();
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_plain_text_command_reply_becomes_message() {
        let upstream = Canned::new(Ok((200, "Left organization successfully")));
        let env = forward_message(
            &upstream,
            &caller_with_token(),
            UpstreamRequest::post("/api/reader/enrollments/organizations/o-1/leave"),
            "fallback",
        )
        .await
        .unwrap();
        assert_eq!(env.status, StatusCode::OK);
        assert_eq!(env.body, json!({"message": "Left organization successfully"}));
    }

    #[test]
    fn test_caller_takes_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert(&X_FORWARDED_FOR, HeaderValue::from_static("1.2.3.4, 5.6.7.8"));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=abc"));
        let caller = Caller::from_headers(&headers, "access_token");
        assert_eq!(caller.forwarded_for.unwrap(), "1.2.3.4");
        assert_eq!(caller.credential.unwrap().token(), "abc");
    }
}
