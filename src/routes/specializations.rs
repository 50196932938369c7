//! Business-admin specializations, scoped to a domain.

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::boundary::guard;
use crate::http::error::GatewayError;
use crate::http::extract::{Path, Query};
use crate::http::request::PageQuery;
use crate::http::response::{Envelope, Mode};
use crate::http::server::AppState;
use crate::proxy::{Caller, UpstreamRequest};
use crate::routes::{listing, parse_json, proxy, query_pairs, required, to_body};

const UPSTREAM: &str = "/api/business-admin/specializations";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/business-admin/specializations",
            get(list_specializations).post(create_specialization),
        )
        .route(
            "/api/business-admin/specializations/{id}",
            get(get_specialization)
                .put(update_specialization)
                .delete(delete_specialization),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomainScope {
    domain_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecializationBody {
    name: Option<String>,
    domain_id: Option<String>,
}

async fn list_specializations(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageQuery>,
    Query(scope): Query<DomainScope>,
    RawQuery(raw): RawQuery,
) -> Response {
    guard("api/business-admin/specializations", state.mode(), async {
        if state.is_mock() {
            let domain_id = required(scope.domain_id.as_deref(), "domainId is required")?;
            let items = state
                .fixtures
                .specializations
                .list(domain_id, page.search());
            return Ok(Envelope::ok(
                Mode::Mock,
                listing("specializations", to_body(&items)?, items.len(), &page),
            ));
        }
        let request = UpstreamRequest::get(UPSTREAM).query_pairs(query_pairs(raw.as_deref()));
        proxy(&state, &caller, request).await
    })
    .await
}

async fn get_specialization(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Response {
    guard("api/business-admin/specializations/get", state.mode(), async {
        if state.is_mock() {
            let spec = state.fixtures.specializations.get(&id).ok_or_else(|| {
                GatewayError::not_found(format!("Specialization with id {id} not found"))
            })?;
            return Envelope::json(StatusCode::OK, Mode::Mock, &spec);
        }
        proxy(&state, &caller, UpstreamRequest::get(UPSTREAM).segment(id)).await
    })
    .await
}

async fn create_specialization(
    State(state): State<AppState>,
    caller: Caller,
    body: Bytes,
) -> Response {
    guard("api/business-admin/specializations/create", state.mode(), async {
        let input: SpecializationBody = parse_json(&body)?;
        let domain_id = required(input.domain_id.as_deref(), "domainId is required")?;

        if state.is_mock() {
            let spec = state
                .fixtures
                .specializations
                .create(input.name.as_deref().unwrap_or_default(), domain_id)?;
            return Envelope::json(StatusCode::CREATED, Mode::Mock, &spec);
        }
        let request = UpstreamRequest::post(UPSTREAM).json(json!({
            "name": input.name,
            "domainId": domain_id,
        }));
        proxy(&state, &caller, request).await
    })
    .await
}

async fn update_specialization(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    guard("api/business-admin/specializations/update", state.mode(), async {
        let input: SpecializationBody = parse_json(&body)?;
        if state.is_mock() {
            let spec = state
                .fixtures
                .specializations
                .update(&id, input.name.as_deref())?;
            return Envelope::json(StatusCode::OK, Mode::Mock, &spec);
        }
        let request = UpstreamRequest::put(UPSTREAM)
            .segment(id)
            .json(parse_json::<Value>(&body)?);
        proxy(&state, &caller, request).await
    })
    .await
}

async fn delete_specialization(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Response {
    guard("api/business-admin/specializations/delete", state.mode(), async {
        if state.is_mock() {
            state.fixtures.specializations.delete(&id)?;
            return Ok(Envelope::ok(
                Mode::Mock,
                json!({ "message": "Specialization deleted successfully." }),
            ));
        }
        proxy(&state, &caller, UpstreamRequest::delete(UPSTREAM).segment(id)).await
    })
    .await
}
