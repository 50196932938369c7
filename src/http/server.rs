//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every API route
//! - Wire up middleware (request ID, tracing, timeout, body limit, auth gate)
//! - Serve the built frontend for page navigations when configured
//! - Bind to the listener and shut down gracefully

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::Uri,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::fixtures::Fixtures;
use crate::http::error::GatewayError;
use crate::http::request::{propagate_request_id, request_span, set_request_id};
use crate::http::response::Mode;
use crate::lifecycle::Shutdown;
use crate::proxy::client::{HttpUpstream, TransportError, Upstream};
use crate::routes;
use crate::security::gate::auth_gate;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub upstream: Arc<dyn Upstream>,
    pub fixtures: Arc<Fixtures>,
    pub shutdown: Arc<Shutdown>,
}

impl AppState {
    pub fn mode(&self) -> Mode {
        self.config.mode()
    }

    pub fn is_mock(&self) -> bool {
        self.config.mock.enabled
    }

    /// Whether read-only routes may answer from fixtures when the upstream is down.
    pub fn fallback_enabled(&self) -> bool {
        self.config.upstream.fallback_to_fixtures
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server talking to the configured upstream, with seeded fixtures.
    pub fn new(config: GatewayConfig) -> Result<Self, TransportError> {
        let upstream = HttpUpstream::new(&config)?;
        tracing::info!(
            base_url = %upstream.base_url(),
            mode = %config.mode(),
            "Upstream client ready"
        );
        Ok(Self::with_parts(
            Arc::new(config),
            Arc::new(upstream),
            Arc::new(Fixtures::seeded()),
        ))
    }

    /// Assemble a server from explicit parts.
    pub fn with_parts(
        config: Arc<GatewayConfig>,
        upstream: Arc<dyn Upstream>,
        fixtures: Arc<Fixtures>,
    ) -> Self {
        let state = AppState {
            config,
            upstream,
            fixtures,
            shutdown: Arc::new(Shutdown::new()),
        };
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();

        let app = routes::router();
        let app = match &config.frontend.static_dir {
            Some(dir) => app.fallback_service(ServeDir::new(dir)),
            None => app.fallback(not_found),
        };

        app.layer(middleware::from_fn_with_state(state.clone(), auth_gate))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
            .layer(set_request_id())
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `signal` resolves.
    pub async fn run<F>(self, listener: TcpListener, signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, mode = %self.state.mode(), "HTTP server starting");

        let shutdown = self.state.shutdown.clone();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                tracing::info!("Shutdown signal received");
                // Ends open event streams so connections can drain.
                shutdown.trigger();
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn not_found(State(state): State<AppState>, uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No route matched");
    GatewayError::not_found("Not Found")
        .into_envelope(state.mode())
        .into_response()
}
