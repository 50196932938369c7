use axum::{extract::State, response::Response, routing::get, Router};
use serde_json::json;

use crate::http::boundary::guard;
use crate::http::response::Envelope;
use crate::http::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

/// Liveness probe; never touches the upstream.
async fn health(State(state): State<AppState>) -> Response {
    let mode = state.mode();
    guard("api/health", mode, async move {
        Ok(Envelope::ok(mode, json!({ "status": "ok", "mode": mode })))
    })
    .await
}
