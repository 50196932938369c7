//! Contact-admin tickets.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};

use crate::fixtures::tickets::ContactRequest;
use crate::http::boundary::guard;
use crate::http::error::GatewayError;
use crate::http::extract::Path;
use crate::http::response::{Envelope, Mode};
use crate::http::server::AppState;
use crate::proxy::{pipeline, Caller, UpstreamRequest};
use crate::routes::{parse_json, required, to_body};

const TICKET_CODE_PREFIX: &str = "TCK-";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/contact-admin", post(create_ticket))
        .route("/api/contact-admin/{ticket_id}", get(get_ticket))
}

async fn create_ticket(State(state): State<AppState>, caller: Caller, body: Bytes) -> Response {
    guard("api/contact-admin", state.mode(), async {
        let payload: ContactRequest = parse_json(&body)?;
        payload.validate()?;

        if state.is_mock() {
            let ticket = state.fixtures.tickets.create(payload)?;
            return Envelope::json(StatusCode::CREATED, Mode::Mock, &ticket);
        }

        caller.require()?;
        let request = UpstreamRequest::post("/api/contact-tickets").json(to_body(&payload)?);
        pipeline::forward_json(state.upstream.as_ref(), &caller, request).await
    })
    .await
}

/// Upstream lookup path: codes and ids are served by different endpoints.
fn ticket_lookup(id_or_code: &str) -> UpstreamRequest {
    let request = UpstreamRequest::get("/api/contact-tickets");
    if id_or_code.starts_with(TICKET_CODE_PREFIX) {
        request.segment("code").segment(id_or_code)
    } else {
        request.segment(id_or_code)
    }
}

async fn get_ticket(
    State(state): State<AppState>,
    caller: Caller,
    Path(ticket_id): Path<String>,
) -> Response {
    guard("api/contact-admin/ticket", state.mode(), async {
        let ticket_id = required(Some(ticket_id.as_str()), "ticketId is required")?;

        if state.is_mock() {
            let ticket = state
                .fixtures
                .tickets
                .find(ticket_id)
                .ok_or_else(|| GatewayError::not_found("Ticket not found"))?;
            return Envelope::json(StatusCode::OK, Mode::Mock, &ticket);
        }

        caller.require()?;
        pipeline::forward_json(state.upstream.as_ref(), &caller, ticket_lookup(ticket_id)).await
    })
    .await
}
