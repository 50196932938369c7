//! The signed-in user's profile.

use axum::{
    body::Bytes,
    extract::State,
    response::Response,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::http::boundary::guard;
use crate::http::extract::Query;
use crate::http::response::{Envelope, Mode};
use crate::http::server::AppState;
use crate::proxy::{pipeline, Caller, UpstreamRequest};
use crate::routes::{parse_json, proxy};

const UPSTREAM: &str = "/api/profile";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/profile/get", get(get_profile))
        .route("/api/profile/update", put(update_profile))
}

/// Which role's fixture to serve in mock mode.
#[derive(Debug, Default, Deserialize)]
struct RoleQuery {
    role: Option<String>,
}

async fn get_profile(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<RoleQuery>,
) -> Response {
    guard("api/profile/get", state.mode(), async {
        let role = query.role.as_deref();
        if state.is_mock() {
            return Ok(Envelope::ok(Mode::Mock, state.fixtures.profile.get(role)));
        }

        caller.require()?;
        pipeline::forward_json_or(
            state.upstream.as_ref(),
            &caller,
            UpstreamRequest::get(UPSTREAM),
            state.fallback_enabled(),
            || Ok(state.fixtures.profile.get(role)),
        )
        .await
    })
    .await
}

async fn update_profile(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<RoleQuery>,
    body: Bytes,
) -> Response {
    guard("api/profile/update", state.mode(), async {
        let patch: Value = parse_json(&body)?;
        if state.is_mock() {
            let profile = state.fixtures.profile.update(query.role.as_deref(), patch)?;
            return Ok(Envelope::ok(Mode::Mock, profile));
        }
        proxy(&state, &caller, UpstreamRequest::put(UPSTREAM).json(patch)).await
    })
    .await
}
