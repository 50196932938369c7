//! Business-admin catalogs: tags, domains and document types.
//!
//! # Responsibilities
//! - CRUD over the three catalogs, from fixtures or the admin upstream
//! - Tag review (approve or reject a pending tag)
//! - Reshape the upstream's paged document-type listing into the
//!   `{types, total, page, limit}` form the admin screens read
//!
//! # Design Decisions
//! - Listing queries are forwarded verbatim, except for document types whose
//!   upstream pages from zero and names its search field `name`

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::StatusCode,
    response::Response,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::fixtures::taxonomy::TagStatus;
use crate::fixtures::ListFilter;
use crate::http::boundary::guard;
use crate::http::error::GatewayResult;
use crate::http::extract::{Path, Query};
use crate::http::request::PageQuery;
use crate::http::response::{Envelope, Mode};
use crate::http::server::AppState;
use crate::proxy::client::UpstreamResponse;
use crate::proxy::normalize::{parse_body, unwrap_response};
use crate::proxy::{pipeline, Caller, UpstreamRequest};
use crate::routes::{listing, parse_json, parse_json_or_default, proxy, query_pairs, to_body};

const TAGS_UPSTREAM: &str = "/api/admin/tags";
const DOMAINS_UPSTREAM: &str = "/api/admin/domains";
const DOC_TYPES_UPSTREAM: &str = "/api/admin/doc-types";

/// Page size requested when the browser asks for "everything".
const ALL_DOC_TYPES: &str = "1000";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/business-admin/tags", get(list_tags).post(create_tag))
        .route(
            "/api/business-admin/tags/{id}",
            put(update_tag).delete(delete_tag).post(review_tag),
        )
        .route("/api/business-admin/domains", get(list_domains).post(create_domain))
        .route(
            "/api/business-admin/domains/{id}",
            put(update_domain).delete(delete_domain),
        )
        .route("/api/business-admin/types", get(list_types).post(create_type))
        .route("/api/business-admin/types/{id}", put(update_type))
}

#[derive(Debug, Default, Deserialize)]
struct NameBody {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TagUpdate {
    name: Option<String>,
    status: Option<TagStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewDecision {
    approved: Option<bool>,
}

impl ReviewDecision {
    fn approved(&self) -> bool {
        self.approved.unwrap_or(true)
    }
}

fn deleted(kind: &str) -> Value {
    json!({ "message": format!("{kind} deleted successfully.") })
}

// Tags

async fn list_tags(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ListFilter>,
    RawQuery(raw): RawQuery,
) -> Response {
    guard("api/business-admin/tags", state.mode(), async {
        if state.is_mock() {
            let tags = state.fixtures.tags.list(&filter)?;
            return Ok(Envelope::ok(
                Mode::Mock,
                listing("tags", to_body(&tags)?, tags.len(), &page),
            ));
        }
        let request = UpstreamRequest::get(TAGS_UPSTREAM).query_pairs(query_pairs(raw.as_deref()));
        proxy(&state, &caller, request).await
    })
    .await
}

async fn create_tag(State(state): State<AppState>, caller: Caller, body: Bytes) -> Response {
    guard("api/business-admin/tags/create", state.mode(), async {
        let input: NameBody = parse_json(&body)?;
        if state.is_mock() {
            let tag = state.fixtures.tags.create(input.name.as_deref().unwrap_or_default())?;
            return Envelope::json(StatusCode::CREATED, Mode::Mock, &tag);
        }
        let request = UpstreamRequest::post(TAGS_UPSTREAM).json(parse_json::<Value>(&body)?);
        proxy(&state, &caller, request).await
    })
    .await
}

async fn update_tag(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    guard("api/business-admin/tags/update", state.mode(), async {
        let input: TagUpdate = parse_json_or_default(&body)?;
        if state.is_mock() {
            let tag = state
                .fixtures
                .tags
                .update_tag(&id, input.name.as_deref(), input.status)?;
            return Envelope::json(StatusCode::OK, Mode::Mock, &tag);
        }
        let payload = match parse_json_or_default::<Value>(&body)? {
            Value::Null => json!({}),
            payload => payload,
        };
        let request = UpstreamRequest::put(TAGS_UPSTREAM).segment(id).json(payload);
        proxy(&state, &caller, request).await
    })
    .await
}

async fn delete_tag(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Response {
    guard("api/business-admin/tags/delete", state.mode(), async {
        if state.is_mock() {
            state.fixtures.tags.delete(&id)?;
            return Ok(Envelope::ok(Mode::Mock, deleted("Tag")));
        }
        proxy(&state, &caller, UpstreamRequest::delete(TAGS_UPSTREAM).segment(id)).await
    })
    .await
}

/// `POST /tags/{id}` settles a pending tag; `approved` defaults to true.
async fn review_tag(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    guard("api/business-admin/tags/review", state.mode(), async {
        let decision: ReviewDecision = parse_json_or_default(&body)?;
        if state.is_mock() {
            let tag = state.fixtures.tags.review(&id, decision.approved())?;
            return Envelope::json(StatusCode::OK, Mode::Mock, &tag);
        }
        let request = UpstreamRequest::post(TAGS_UPSTREAM)
            .segment(id)
            .segment("review")
            .json(json!({ "approved": decision.approved() }));
        proxy(&state, &caller, request).await
    })
    .await
}

// Domains

async fn list_domains(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ListFilter>,
    RawQuery(raw): RawQuery,
) -> Response {
    guard("api/business-admin/domains", state.mode(), async {
        if state.is_mock() {
            let domains = state.fixtures.domains.list(&filter)?;
            return Ok(Envelope::ok(
                Mode::Mock,
                listing("domains", to_body(&domains)?, domains.len(), &page),
            ));
        }
        let request =
            UpstreamRequest::get(DOMAINS_UPSTREAM).query_pairs(query_pairs(raw.as_deref()));
        proxy(&state, &caller, request).await
    })
    .await
}

async fn create_domain(State(state): State<AppState>, caller: Caller, body: Bytes) -> Response {
    guard("api/business-admin/domains/create", state.mode(), async {
        let input: NameBody = parse_json(&body)?;
        if state.is_mock() {
            let domain = state
                .fixtures
                .domains
                .create(input.name.as_deref().unwrap_or_default())?;
            return Envelope::json(StatusCode::CREATED, Mode::Mock, &domain);
        }
        let request = UpstreamRequest::post(DOMAINS_UPSTREAM).json(parse_json::<Value>(&body)?);
        proxy(&state, &caller, request).await
    })
    .await
}

async fn update_domain(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    guard("api/business-admin/domains/update", state.mode(), async {
        let input: NameBody = parse_json(&body)?;
        if state.is_mock() {
            let domain = state.fixtures.domains.update(&id, input.name.as_deref())?;
            return Envelope::json(StatusCode::OK, Mode::Mock, &domain);
        }
        let request = UpstreamRequest::put(DOMAINS_UPSTREAM)
            .segment(id)
            .json(parse_json::<Value>(&body)?);
        proxy(&state, &caller, request).await
    })
    .await
}

async fn delete_domain(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Response {
    guard("api/business-admin/domains/delete", state.mode(), async {
        if state.is_mock() {
            state.fixtures.domains.delete(&id)?;
            return Ok(Envelope::ok(Mode::Mock, deleted("Domain")));
        }
        proxy(&state, &caller, UpstreamRequest::delete(DOMAINS_UPSTREAM).segment(id)).await
    })
    .await
}

// Document types

/// Query for the upstream doc-type listing: `name`, zero-based `page`, `size`.
fn doc_type_query(pairs: &[(String, String)]) -> Vec<(String, String)> {
    let param = |key: &str| {
        pairs
            .iter()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    };

    let mut query = Vec::new();
    if let Some(name) = param("name").or_else(|| param("search")) {
        query.push(("name".to_string(), name));
    }

    let page = param("page");
    let size = param("limit").or_else(|| param("size"));
    if page.is_none() && size.is_none() {
        query.push(("page".to_string(), "0".to_string()));
        query.push(("size".to_string(), ALL_DOC_TYPES.to_string()));
    } else {
        let zero_based = page
            .and_then(|p| p.parse::<u64>().ok())
            .map_or(0, |p| p.saturating_sub(1));
        query.push(("page".to_string(), zero_based.to_string()));
        query.push(("size".to_string(), size.unwrap_or_else(|| "10".to_string())));
    }
    query
}

/// `{success, data: [...], pageInfo}` → `{types, total, page, limit}` (page one-based).
fn doc_type_listing(raw: &Value) -> Value {
    let entries = match raw {
        Value::Array(items) => items.clone(),
        other => other
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    };
    let page_info = raw.get("pageInfo");
    let info = |key: &str| page_info.and_then(|p| p.get(key)).and_then(Value::as_u64);

    let types: Vec<Value> = entries
        .iter()
        .map(|t| {
            json!({
                "id": t.get("id"),
                "code": t.get("code"),
                "name": t.get("name"),
                "description": t.get("description"),
                "createdAt": t.get("createdAt").or_else(|| t.get("createdDate")),
            })
        })
        .collect();

    json!({
        "total": info("totalElements").unwrap_or(types.len() as u64),
        "page": info("page").unwrap_or(0) + 1,
        "limit": info("size").unwrap_or(10),
        "types": types,
    })
}

fn doc_type_envelope(response: &UpstreamResponse) -> GatewayResult<Envelope> {
    if !response.is_success() {
        unwrap_response(response)?;
    }
    let raw = parse_body(&response.body)?;
    Ok(Envelope::ok(Mode::Real, doc_type_listing(&raw)))
}

async fn list_types(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ListFilter>,
    RawQuery(raw): RawQuery,
) -> Response {
    guard("api/business-admin/types", state.mode(), async {
        if state.is_mock() {
            let types = state.fixtures.document_types.list(&filter)?;
            return Ok(Envelope::ok(
                Mode::Mock,
                listing("types", to_body(&types)?, types.len(), &page),
            ));
        }

        caller.require()?;
        let request = UpstreamRequest::get(DOC_TYPES_UPSTREAM)
            .query_pairs(doc_type_query(&query_pairs(raw.as_deref())));
        let response = pipeline::forward(state.upstream.as_ref(), &caller, request).await?;
        doc_type_envelope(&response)
    })
    .await
}

async fn create_type(State(state): State<AppState>, caller: Caller, body: Bytes) -> Response {
    guard("api/business-admin/types/create", state.mode(), async {
        let input: NameBody = parse_json(&body)?;
        if state.is_mock() {
            let doc_type = state
                .fixtures
                .document_types
                .create(input.name.as_deref().unwrap_or_default())?;
            return Envelope::json(StatusCode::CREATED, Mode::Mock, &doc_type);
        }
        let request = UpstreamRequest::post(DOC_TYPES_UPSTREAM).json(parse_json::<Value>(&body)?);
        proxy(&state, &caller, request).await
    })
    .await
}

async fn update_type(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    guard("api/business-admin/types/update", state.mode(), async {
        let input: NameBody = parse_json(&body)?;
        if state.is_mock() {
            let doc_type = state.fixtures.document_types.update(&id, input.name.as_deref())?;
            return Envelope::json(StatusCode::OK, Mode::Mock, &doc_type);
        }
        let request = UpstreamRequest::put(DOC_TYPES_UPSTREAM)
            .segment(id)
            .json(parse_json::<Value>(&body)?);
        proxy(&state, &caller, request).await
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &str) -> Vec<(String, String)> {
        query_pairs(Some(raw))
    }

    #[test]
    fn test_doc_type_query_defaults_to_everything() {
        assert_eq!(
            doc_type_query(&pairs("")),
            vec![
                ("page".to_string(), "0".to_string()),
                ("size".to_string(), "1000".to_string())
            ]
        );
    }

    #[test]
    fn test_doc_type_query_maps_search_and_page() {
        assert_eq!(
            doc_type_query(&pairs("search=pdf&page=3&limit=20")),
            vec![
                ("name".to_string(), "pdf".to_string()),
                ("page".to_string(), "2".to_string()),
                ("size".to_string(), "20".to_string())
            ]
        );
    }

    #[test]
    fn test_doc_type_listing_reads_page_info() {
        let raw = json!({
            "success": true,
            "data": [{"id": "t1", "name": "Thesis", "createdDate": "2025-01-01"}],
            "pageInfo": {"page": 0, "size": 10, "totalElements": 31},
            "timestamp": "2025-01-01T00:00:00Z"
        });
        let listing = doc_type_listing(&raw);
        assert_eq!(listing["total"], 31);
        assert_eq!(listing["page"], 1);
        assert_eq!(listing["types"][0]["createdAt"], "2025-01-01");
    }

    #[test]
    fn test_review_defaults_to_approve() {
        let decision: ReviewDecision =
            parse_json_or_default(&Bytes::from_static(b"")).unwrap();
        assert!(decision.approved());
    }
}
