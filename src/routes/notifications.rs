//! Notification inbox and its live event stream.
//!
//! # Responsibilities
//! - List, count and mark notifications read (fixtures or upstream)
//! - Relay the upstream server-sent event stream, or emit heartbeats in mock mode
//!
//! # Design Decisions
//! - The two read-only routes may answer from fixtures when the upstream is
//!   unreachable and fallback is enabled; writes never do
//! - Event streams end when shutdown begins so connections can drain

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Router,
};
use futures_util::{future, stream, Stream, StreamExt, TryStreamExt};
use serde_json::json;

use crate::http::boundary::guard;
use crate::http::error::{GatewayError, GatewayResult};
use crate::http::extract::{Path, Query};
use crate::http::request::PageQuery;
use crate::http::response::{Envelope, Mode, X_MODE};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::{pipeline, Caller, TransportError, UpstreamRequest};
use crate::routes::to_body;

const EVENTS_CONTEXT: &str = "api/notifications/events";
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const CONNECTED: &[u8] = b": connected\n\n";
const HEARTBEAT: &[u8] = b": heartbeat\n\n";
const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/read-all", patch(mark_all_read))
        .route("/api/notifications/events", get(events))
        .route("/api/notifications/{id}/read", patch(mark_read))
}

async fn list(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<PageQuery>,
) -> Response {
    guard("api/notifications", state.mode(), async {
        if state.is_mock() {
            let inbox = state.fixtures.notifications.inbox();
            return Ok(Envelope::ok(Mode::Mock, to_body(&inbox)?));
        }

        caller.require()?;
        let request = UpstreamRequest::get("/api/notifications").query_pairs(query.upstream_pairs());
        pipeline::forward_json_or(
            state.upstream.as_ref(),
            &caller,
            request,
            state.fallback_enabled(),
            || to_body(&state.fixtures.notifications.inbox()),
        )
        .await
    })
    .await
}

async fn unread_count(State(state): State<AppState>, caller: Caller) -> Response {
    guard("api/notifications/unread-count", state.mode(), async {
        let count = || json!({ "count": state.fixtures.notifications.unread_count() });
        if state.is_mock() {
            return Ok(Envelope::ok(Mode::Mock, count()));
        }

        caller.require()?;
        pipeline::forward_json_or(
            state.upstream.as_ref(),
            &caller,
            UpstreamRequest::get("/api/notifications/unread-count"),
            state.fallback_enabled(),
            || Ok(count()),
        )
        .await
    })
    .await
}

async fn mark_read(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Response {
    guard("api/notifications/read", state.mode(), async {
        if state.is_mock() {
            if !state.fixtures.notifications.mark_as_read(&id) {
                return Err(GatewayError::not_found(format!(
                    "Notification with id {id} not found"
                )));
            }
            return Ok(Envelope::ok(Mode::Mock, json!({ "id": id, "isRead": true })));
        }

        caller.require()?;
        let request = UpstreamRequest::patch("/api/notifications")
            .segment(id)
            .segment("read");
        pipeline::forward_json(state.upstream.as_ref(), &caller, request).await
    })
    .await
}

async fn mark_all_read(State(state): State<AppState>, caller: Caller) -> Response {
    guard("api/notifications/read-all", state.mode(), async {
        if state.is_mock() {
            let updated = state.fixtures.notifications.mark_all_as_read();
            return Ok(Envelope::ok(Mode::Mock, json!({ "updated": updated })));
        }

        caller.require()?;
        pipeline::forward_json(
            state.upstream.as_ref(),
            &caller,
            UpstreamRequest::patch("/api/notifications/read-all"),
        )
        .await
    })
    .await
}

async fn events(State(state): State<AppState>, caller: Caller) -> Response {
    let mode = state.mode();
    let start = Instant::now();

    let opened = if state.is_mock() {
        Ok(mock_events(&state))
    } else {
        relay_events(&state, &caller).await
    };

    match opened {
        Ok(response) => {
            metrics::record_request(EVENTS_CONTEXT, response.status().as_u16(), mode, start);
            response
        }
        Err(err) => guard(EVENTS_CONTEXT, mode, future::ready(Err(err))).await,
    }
}

/// `: connected` followed by a heartbeat comment every `period`.
fn heartbeats(period: Duration) -> impl Stream<Item = Result<Bytes, Infallible>> {
    let first = tokio::time::Instant::now() + period;
    let ticks = stream::unfold(tokio::time::interval_at(first, period), |mut ticker| async move {
        ticker.tick().await;
        Some((Ok(Bytes::from_static(HEARTBEAT)), ticker))
    });
    stream::once(future::ready(Ok(Bytes::from_static(CONNECTED)))).chain(ticks)
}

fn event_stream_headers(headers: &mut HeaderMap, cache_control: &'static str) {
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    headers.insert(X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
}

fn mock_events(state: &AppState) -> Response {
    let shutdown = state.shutdown.clone();
    let stream = heartbeats(HEARTBEAT_INTERVAL)
        .take_until(async move { shutdown.wait().await });

    let mut response = Body::from_stream(stream).into_response();
    event_stream_headers(response.headers_mut(), "no-cache");
    response
        .headers_mut()
        .insert(X_MODE, HeaderValue::from_static(Mode::Mock.as_str()));
    response
}

/// Headers that describe the upstream connection rather than the stream.
fn is_connection_header(name: &HeaderName) -> bool {
    *name == header::CONTENT_ENCODING
        || *name == header::CONTENT_LENGTH
        || *name == header::TRANSFER_ENCODING
        || *name == header::CONNECTION
}

const STREAM_UNAVAILABLE: &str = "Upstream service is unavailable or stream failed.";

/// Text of a refused event stream. A body that cannot be read in full is
/// logged and replaced by the generic message.
async fn refusal_message(
    body: stream::BoxStream<'static, Result<Bytes, TransportError>>,
    status: StatusCode,
) -> String {
    let read = body
        .try_fold(Vec::new(), |mut acc, chunk| {
            acc.extend_from_slice(&chunk);
            future::ready(Ok(acc))
        })
        .await;
    let bytes = match read {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%status, error = %err, "Failed to read refused event stream body");
            return STREAM_UNAVAILABLE.to_string();
        }
    };
    let text = String::from_utf8_lossy(&bytes).trim().to_string();
    if text.is_empty() {
        STREAM_UNAVAILABLE.to_string()
    } else {
        text
    }
}

async fn relay_events(state: &AppState, caller: &Caller) -> GatewayResult<Response> {
    caller.require()?;
    let request = pipeline::prepare(
        UpstreamRequest::get("/api/notifications/events")
            .header(header::ACCEPT, HeaderValue::from_static("text/event-stream")),
        caller,
    );

    let upstream = state
        .upstream
        .stream(request)
        .await
        .map_err(pipeline::transport)?;

    if !upstream.status.is_success() {
        let message = refusal_message(upstream.body, upstream.status).await;
        tracing::warn!(status = %upstream.status, "Event stream refused upstream");
        return Ok((
            upstream.status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))],
            message,
        )
            .into_response());
    }

    let shutdown = state.shutdown.clone();
    let body = upstream
        .body
        .take_until(async move { shutdown.wait().await });

    let mut response = Body::from_stream(body).into_response();
    *response.status_mut() = StatusCode::OK;
    for (name, value) in upstream.headers.iter() {
        if !is_connection_header(name) {
            response.headers_mut().insert(name.clone(), value.clone());
        }
    }
    event_stream_headers(response.headers_mut(), "no-cache, no-transform");
    response
        .headers_mut()
        .insert(X_MODE, HeaderValue::from_static(Mode::Real.as_str()));
    Ok(response)
}
