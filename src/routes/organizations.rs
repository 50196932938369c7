//! Reader memberships: organizations joined, leaving one, answering invitations.
//!
//! The backend has no per-organization read endpoint, so a real-mode detail
//! lookup pages through the reader's joined organizations and picks the match.
//! Leave and invitation answers come back as bare text messages.

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::boundary::guard;
use crate::http::error::{GatewayError, GatewayResult};
use crate::http::extract::Path;
use crate::http::response::{Envelope, Mode};
use crate::http::server::AppState;
use crate::proxy::{pipeline, Caller, UpstreamRequest};
use crate::routes::{parse_json, proxy, query_pairs, required, to_body};

const ENROLLMENTS_UPSTREAM: &str = "/api/reader/enrollments";
const JOINED: &str = "organizations";
/// Page size used when scanning joined organizations for one id.
const LOOKUP_PAGE_SIZE: &str = "1000";

const LEFT: &str = "Left organization successfully.";
const ACCEPTED: &str = "Invitation accepted successfully";
const REJECTED: &str = "Invitation rejected successfully";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/reader/organizations", get(list_organizations))
        .route("/api/reader/organizations/{id}", get(get_organization))
        .route("/api/reader/organizations/{id}/leave", post(leave_organization))
        .route("/api/reader/enrollments/{enrollment_id}", post(answer_enrollment))
}

fn organization_not_found() -> GatewayError {
    GatewayError::not_found("Organization not found")
}

async fn list_organizations(
    State(state): State<AppState>,
    caller: Caller,
    RawQuery(raw): RawQuery,
) -> Response {
    guard("api/reader/organizations", state.mode(), async {
        if state.is_mock() {
            let list = state.fixtures.organizations.list();
            return Ok(Envelope::ok(Mode::Mock, to_body(&list)?));
        }
        let request = UpstreamRequest::get(ENROLLMENTS_UPSTREAM)
            .segment(JOINED)
            .query_pairs(query_pairs(raw.as_deref()));
        proxy(&state, &caller, request).await
    })
    .await
}

async fn get_organization(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Response {
    guard("api/reader/organizations/detail", state.mode(), async {
        if state.is_mock() {
            let organization = state
                .fixtures
                .organizations
                .get(&id)
                .ok_or_else(organization_not_found)?;
            return Envelope::json(StatusCode::OK, Mode::Mock, &organization);
        }
        let request = UpstreamRequest::get(ENROLLMENTS_UPSTREAM)
            .segment(JOINED)
            .query("page", "0")
            .query("size", LOOKUP_PAGE_SIZE);
        let listing = proxy(&state, &caller, request).await?;
        let organization =
            find_organization(&listing.body, &id).ok_or_else(organization_not_found)?;
        Ok(Envelope::ok(Mode::Real, organization))
    })
    .await
}

/// Items of a listing body: a bare array, or the array under one of the
/// paging wrappers the backend uses.
fn listing_items(body: &Value) -> &[Value] {
    if let Some(items) = body.as_array() {
        return items;
    }
    ["content", "items", "data", "organizations"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn find_organization(body: &Value, id: &str) -> Option<Value> {
    listing_items(body)
        .iter()
        .find(|item| {
            ["organizationId", "id"]
                .iter()
                .any(|key| item.get(key).and_then(Value::as_str) == Some(id))
        })
        .cloned()
}

async fn leave_organization(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Response {
    guard("api/reader/organizations/leave", state.mode(), async {
        if state.is_mock() {
            if !state.fixtures.organizations.leave(&id) {
                return Err(organization_not_found());
            }
            return Ok(Envelope::ok(Mode::Mock, json!({ "message": LEFT })));
        }
        caller.require()?;
        let request = UpstreamRequest::post(ENROLLMENTS_UPSTREAM)
            .segment(JOINED)
            .segment(id)
            .segment("leave");
        pipeline::forward_message(state.upstream.as_ref(), &caller, request, LEFT).await
    })
    .await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EnrollmentAction {
    Accept,
    Reject,
}

impl EnrollmentAction {
    fn path(&self) -> &'static str {
        match self {
            EnrollmentAction::Accept => "accept",
            EnrollmentAction::Reject => "reject",
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            EnrollmentAction::Accept => ACCEPTED,
            EnrollmentAction::Reject => REJECTED,
        }
    }

    fn resulting_status(&self) -> &'static str {
        match self {
            EnrollmentAction::Accept => "ACCEPTED",
            EnrollmentAction::Reject => "REJECTED",
        }
    }
}

#[derive(Debug, Deserialize)]
struct EnrollmentDecision {
    action: Option<String>,
}

fn parse_action(body: &Bytes) -> GatewayResult<EnrollmentAction> {
    let decision: EnrollmentDecision = parse_json(body)?;
    match decision.action.as_deref().map(str::trim) {
        Some(a) if a.eq_ignore_ascii_case("accept") => Ok(EnrollmentAction::Accept),
        Some(a) if a.eq_ignore_ascii_case("reject") => Ok(EnrollmentAction::Reject),
        _ => Err(GatewayError::bad_request(
            "action must be either \"accept\" or \"reject\"",
        )),
    }
}

/// Accept or reject an organization's invitation.
async fn answer_enrollment(
    State(state): State<AppState>,
    caller: Caller,
    Path(enrollment_id): Path<String>,
    body: Bytes,
) -> Response {
    guard("api/reader/enrollments", state.mode(), async {
        let enrollment_id = required(Some(enrollment_id.as_str()), "enrollmentId is required")?;
        let action = parse_action(&body)?;

        if state.is_mock() {
            return Ok(Envelope::ok(
                Mode::Mock,
                json!({ "enrollmentId": enrollment_id, "status": action.resulting_status() }),
            ));
        }
        caller.require()?;
        let request = UpstreamRequest::post(ENROLLMENTS_UPSTREAM)
            .segment(enrollment_id)
            .segment(action.path());
        pipeline::forward_message(
            state.upstream.as_ref(),
            &caller,
            request,
            action.default_message(),
        )
        .await
    })
    .await
}
