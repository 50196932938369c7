//! Route handlers for the browser-facing API.
//!
//! # Data Flow
//! ```text
//! Handler
//!     → boundary::guard (context label, mode)
//!         mock → fixtures::* → Envelope { mode: mock }
//!         real → Caller::require → proxy::pipeline → Envelope { mode: real }
//! ```
//!
//! # Design Decisions
//! - Bodies are taken as raw bytes and parsed here so malformed input is a
//!   400 envelope rather than an extractor rejection
//! - Input validation happens before any fixture or upstream interaction
//! - Each handler makes at most two sequential upstream calls

pub mod health;
pub mod notifications;
pub mod organizations;
pub mod password;
pub mod profile;
pub mod registration;
pub mod session;
pub mod specializations;
pub mod taxonomy;
pub mod tickets;

use axum::{body::Bytes, Router};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::http::error::{GatewayError, GatewayResult};
use crate::http::request::PageQuery;
pub(crate) use crate::http::response::to_body;
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::proxy::{pipeline, Caller, UpstreamRequest};

/// Every API route, unlayered.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(session::routes())
        .merge(password::routes())
        .merge(registration::routes())
        .merge(notifications::routes())
        .merge(tickets::routes())
        .merge(taxonomy::routes())
        .merge(specializations::routes())
        .merge(organizations::routes())
        .merge(profile::routes())
}

/// Proxy `request` upstream on behalf of an authenticated caller.
pub(crate) async fn proxy(
    state: &AppState,
    caller: &Caller,
    request: UpstreamRequest,
) -> GatewayResult<Envelope> {
    caller.require()?;
    pipeline::forward_json(state.upstream.as_ref(), caller, request).await
}

/// Parse a JSON request body.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> GatewayResult<T> {
    serde_json::from_slice(body).map_err(|err| {
        if err.is_data() {
            GatewayError::bad_request(format!("Invalid request body: {err}"))
        } else {
            GatewayError::bad_request("Invalid JSON")
        }
    })
}

/// Like [`parse_json`], but an empty body yields the default value.
pub(crate) fn parse_json_or_default<T: DeserializeOwned + Default>(body: &Bytes) -> GatewayResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_json(body)
}

/// `{<key>: items, total, page, limit}` as returned by fixture listings.
pub(crate) fn listing(key: &str, items: Value, total: usize, query: &PageQuery) -> Value {
    let (page, limit) = query.listing_window();
    let mut body = Map::new();
    body.insert(key.to_string(), items);
    body.insert("total".into(), total.into());
    body.insert("page".into(), page.into());
    body.insert("limit".into(), limit.into());
    Value::Object(body)
}

/// Decode a raw query string into pairs for verbatim forwarding.
pub(crate) fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Trimmed, non-empty text.
pub(crate) fn required<'a>(value: Option<&'a str>, message: &str) -> GatewayResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GatewayError::bad_request(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_parse_json_distinguishes_syntax_from_shape() {
        let err = parse_json::<Named>(&Bytes::from_static(b"{not json")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON");

        let err = parse_json::<Named>(&Bytes::from_static(b"{\"other\":1}")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid request body"));
    }

    #[test]
    fn test_empty_body_defaults() {
        let named: Named = parse_json_or_default(&Bytes::from_static(b"  ")).unwrap();
        assert_eq!(named.name, "");
    }

    #[test]
    fn test_listing_echoes_window() {
        let query = PageQuery {
            page: Some("2".into()),
            limit: Some("5".into()),
            ..PageQuery::default()
        };
        assert_eq!(
            listing("tags", json!([]), 0, &query),
            json!({"tags": [], "total": 0, "page": 2, "limit": 5})
        );
    }
}
