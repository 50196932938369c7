//! Error boundary for route handlers.
//!
//! Runs a handler once and turns whatever it produced into a response.
//! Anticipated failures keep their own status and `{error}` body; anything
//! else is logged against the caller's context label and rendered with the
//! generic dialog payload. No retries.

use std::future::Future;
use std::time::Instant;

use axum::response::{IntoResponse, Response};

use crate::http::error::{GatewayError, GatewayResult};
use crate::http::response::{Envelope, Mode};
use crate::observability::metrics;

/// Run `handler`, converting its outcome into a response.
///
/// `mode` tags error responses; successful envelopes carry their own.
pub async fn guard<F>(context: &'static str, mode: Mode, handler: F) -> Response
where
    F: Future<Output = GatewayResult<Envelope>>,
{
    let start = Instant::now();

    let envelope = match handler.await {
        Ok(envelope) => {
            if envelope.mode == Mode::Fallback {
                metrics::record_upstream_error(context);
            }
            envelope
        }
        Err(err) if err.is_handled() => {
            tracing::debug!(context, status = %err.status(), error = %err, "Handled error");
            err.into_envelope(mode)
        }
        Err(err) => {
            tracing::error!(context, mode = %mode, error = %err, "Unhandled error in route");
            if matches!(err, GatewayError::Transport(_)) {
                metrics::record_upstream_error(context);
            }
            metrics::record_handler_failure(context);
            err.into_envelope(mode)
        }
    };

    metrics::record_request(context, envelope.status.as_u16(), envelope.mode, start);
    envelope.into_response()
}
