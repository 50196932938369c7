//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status, mode
//! - `gateway_request_duration_seconds` (histogram): handler latency by route
//! - `gateway_handler_failures_total` (counter): unhandled errors by route
//! - `gateway_upstream_errors_total` (counter): transport failures by route
//!
//! # Design Decisions
//! - Recording is a no-op until [`init_metrics`] installs the exporter
//! - Route labels are the handler context labels, never raw paths

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::http::response::Mode;

const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(LATENCY_BUCKETS)?
        .install()?;

    describe_counter!("gateway_requests_total", "Requests answered, by route, status and mode");
    describe_histogram!(
        "gateway_request_duration_seconds",
        "Time spent producing a response, by route"
    );
    describe_counter!(
        "gateway_handler_failures_total",
        "Unhandled errors caught by the error boundary"
    );
    describe_counter!(
        "gateway_upstream_errors_total",
        "Upstream calls that failed at the transport level"
    );

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one answered request.
pub fn record_request(route: &'static str, status: u16, mode: Mode, start: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route,
        "status" => status.to_string(),
        "mode" => mode.as_str()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_handler_failure(route: &'static str) {
    counter!("gateway_handler_failures_total", "route" => route).increment(1);
}

/// Count an upstream call that never produced an HTTP response, including
/// ones answered from fixtures instead.
pub fn record_upstream_error(route: &'static str) {
    counter!("gateway_upstream_errors_total", "route" => route).increment(1);
}
