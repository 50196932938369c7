//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) and echo it on the response
//! - Open one tracing span per request carrying that ID
//! - Parse the pagination query shared by list routes
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An inbound `x-request-id` is kept, not replaced
//! - Pagination values stay strings; the upstream owns their meaning

use axum::http::{HeaderName, Request};
use serde::Deserialize;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub const DEFAULT_PAGE: &str = "0";
pub const DEFAULT_SIZE: &str = "10";

/// Layer that stamps `x-request-id` on requests lacking one.
pub fn set_request_id() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request's id onto the response.
pub fn propagate_request_id() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Span for `TraceLayer`, tagged with the request id.
pub fn request_span<B>(request: &Request<B>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

/// `?page=&size=&limit=&search=` as sent by list views.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    /// Alias of `size`; `size` wins when both are present.
    pub limit: Option<String>,
    pub search: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl PageQuery {
    pub fn page(&self) -> &str {
        present(&self.page).unwrap_or(DEFAULT_PAGE)
    }

    pub fn size(&self) -> &str {
        present(&self.size)
            .or_else(|| present(&self.limit))
            .unwrap_or(DEFAULT_SIZE)
    }

    pub fn search(&self) -> Option<&str> {
        present(&self.search)
    }

    /// Query pairs forwarded upstream.
    pub fn upstream_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page().to_string()),
            ("size".to_string(), self.size().to_string()),
        ];
        if let Some(search) = self.search() {
            pairs.push(("search".to_string(), search.to_string()));
        }
        pairs
    }

    /// Numeric page/limit echoed by fixture listings (1-based, 10 per page).
    pub fn listing_window(&self) -> (u64, u64) {
        let page = present(&self.page).and_then(|p| p.parse().ok()).unwrap_or(1);
        let limit = present(&self.limit)
            .or_else(|| present(&self.size))
            .and_then(|l| l.parse().ok())
            .unwrap_or(10);
        (page, limit)
    }
}
