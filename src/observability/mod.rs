//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every route handler (through the error boundary):
//!     → logging.rs (structured log events, request id in the trace span)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for production)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics calls are no-ops until a recorder is installed
//! - Tokens never reach logs

pub mod logging;
pub mod metrics;
