//! Query and path extractors whose rejections use the gateway envelope.
//!
//! axum's own extractors answer a bad query string or path segment with a
//! plain-text body before any handler runs. These wrappers delegate to them
//! and render the rejection as a `400 {error}` stamped with the active mode.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::http::error::GatewayError;
use crate::http::server::AppState;

/// Deserialized query string.
#[derive(Debug, Clone, Default)]
pub struct Query<T>(pub T);

/// Deserialized path parameters.
#[derive(Debug, Clone)]
pub struct Path<T>(pub T);

fn reject<S>(state: &S, kind: &'static str, text: String) -> Response
where
    AppState: FromRef<S>,
{
    let app = AppState::from_ref(state);
    tracing::debug!(kind, error = %text, "Request extraction rejected");
    GatewayError::bad_request(text)
        .into_envelope(app.mode())
        .into_response()
}

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(rejection) => Err(reject(state, "query", rejection.body_text())),
        }
    }
}

impl<S, T> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(rejection) => Err(reject(state, "path", rejection.body_text())),
        }
    }
}
