//! Upstream HTTP adapter.
//!
//! # Responsibilities
//! - Describe an outbound call independently of the HTTP client
//! - Resolve it against the configured base URL
//! - Execute it with caching disabled and return the raw response
//!
//! # Design Decisions
//! - No interpretation of the response here; normalization is a separate stage
//! - Transport failures are returned, never swallowed
//! - Raw bodies keep their own content type (multipart uploads pass through
//!   byte-for-byte, boundary included)
//! - Streaming calls have no whole-request timeout (server-sent events)

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{FutureExt, StreamExt, TryStreamExt};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::GatewayConfig;
use crate::security::credentials::Credential;

/// Failure to complete an upstream call at the transport level.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("invalid upstream url: {0}")]
    Url(String),

    #[error("{0}")]
    Request(String),

    #[error("http client setup failed: {0}")]
    Client(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Outbound request body.
#[derive(Debug, Clone)]
pub enum UpstreamBody {
    Json(Value),
    /// Forwarded verbatim with the inbound content type.
    Raw {
        bytes: Bytes,
        content_type: Option<HeaderValue>,
    },
}

/// A single call to the upstream backend, relative to its base URL.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Path segments, percent-encoded when the URL is built.
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<UpstreamBody>,
}

impl UpstreamRequest {
    /// `path` is split on `/`; dynamic ids should go through [`Self::segment`].
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one path segment, taken literally (slashes included).
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(UpstreamBody::Json(body));
        self
    }

    pub fn raw(mut self, bytes: Bytes, content_type: Option<HeaderValue>) -> Self {
        self.body = Some(UpstreamBody::Raw {
            bytes,
            content_type,
        });
        self
    }

    /// Attach `Authorization: Bearer <token>` when a credential is present.
    pub fn bearer(mut self, credential: Option<&Credential>) -> Self {
        if let Some(value) = credential.and_then(Credential::header_value) {
            self.headers.insert(header::AUTHORIZATION, value);
        }
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Resolve against the upstream base URL.
    pub fn url(&self, base: &str) -> Result<Url, TransportError> {
        let mut url = Url::parse(base).map_err(|e| TransportError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::Url(format!("{} cannot be a base", base)))?
            .pop_if_empty()
            .extend(&self.segments);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }

    /// Headers actually sent: defaults first, explicit headers override.
    pub fn outbound_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));

        let content_type = match &self.body {
            Some(UpstreamBody::Raw {
                content_type: Some(ct),
                ..
            }) => ct.clone(),
            _ => HeaderValue::from_static("application/json"),
        };
        headers.insert(header::CONTENT_TYPE, content_type);

        for (name, value) in self.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}

/// Fully buffered upstream response, uninterpreted.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Upstream response whose body is consumed incrementally.
pub struct UpstreamStream {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BoxStream<'static, Result<Bytes, TransportError>>,
}

/// Executes upstream calls.
pub trait Upstream: Send + Sync {
    /// Perform one call and buffer the whole response.
    fn execute(
        &self,
        request: UpstreamRequest,
    ) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>>;

    /// Perform one call and hand back the body as a stream.
    fn stream(
        &self,
        request: UpstreamRequest,
    ) -> BoxFuture<'_, Result<UpstreamStream, TransportError>>;
}

/// [`Upstream`] backed by a pooled `reqwest` client.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpUpstream {
    pub fn new(config: &GatewayConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.upstream.connect_timeout_secs))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.backend_base_url().to_string(),
            request_timeout: Duration::from_secs(config.upstream.request_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build(&self, request: UpstreamRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let url = request.url(&self.base_url)?;
        let headers = request.outbound_headers();

        let mut builder = self.client.request(request.method, url).headers(headers);
        builder = match request.body {
            Some(UpstreamBody::Json(value)) => builder.body(value.to_string()),
            Some(UpstreamBody::Raw { bytes, .. }) => builder.body(bytes),
            None => builder,
        };
        Ok(builder)
    }
}

impl Upstream for HttpUpstream {
    fn execute(
        &self,
        request: UpstreamRequest,
    ) -> BoxFuture<'_, Result<UpstreamResponse, TransportError>> {
        async move {
            let method = request.method.clone();
            let builder = self.build(request)?.timeout(self.request_timeout);

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;

            tracing::debug!(%method, status = %status, bytes = body.len(), "Upstream responded");
            Ok::<_, TransportError>(UpstreamResponse {
                status,
                headers,
                body,
            })
        }
        .boxed()
    }

    fn stream(
        &self,
        request: UpstreamRequest,
    ) -> BoxFuture<'_, Result<UpstreamStream, TransportError>> {
        async move {
            let response = self.build(request)?.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .bytes_stream()
                .map_err(TransportError::from)
                .boxed();

            Ok::<_, TransportError>(UpstreamStream {
                status,
                headers,
                body,
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_joins_segments_and_query() {
        let req = UpstreamRequest::get("/api/notifications")
            .query("page", "0")
            .query("size", "10");
        let url = req.url("http://localhost:8080").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/notifications?page=0&size=10"
        );
    }

    #[test]
    fn test_dynamic_segment_is_encoded() {
        let req = UpstreamRequest::patch("/api/notifications")
            .segment("a/b c")
            .segment("read");
        let url = req.url("http://be:8080/prefix").unwrap();
        assert_eq!(url.path(), "/prefix/api/notifications/a%2Fb%20c/read");
    }

    #[test]
    fn test_default_headers_are_json_and_no_store() {
        let headers = UpstreamRequest::post("/api/x")
            .json(json!({"a": 1}))
            .outbound_headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_raw_body_keeps_its_content_type() {
        let ct = HeaderValue::from_static("multipart/form-data; boundary=XyZ");
        let headers = UpstreamRequest::post("/api/upload")
            .raw(Bytes::from_static(b"--XyZ--"), Some(ct))
            .outbound_headers();
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "multipart/form-data; boundary=XyZ"
        );
    }

    #[test]
    fn test_bearer_is_attached_only_with_credential() {
        let credential = Credential::new("tok123");
        let with = UpstreamRequest::get("/api/me").bearer(credential.as_ref());
        assert_eq!(with.headers[header::AUTHORIZATION], "Bearer tok123");

        let without = UpstreamRequest::get("/api/me").bearer(None);
        assert!(without.headers.get(header::AUTHORIZATION).is_none());
    }
}
