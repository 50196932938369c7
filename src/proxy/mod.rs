//! Upstream proxying subsystem.
//!
//! # Data Flow
//! ```text
//! Route handler
//!     → pipeline.rs (caller credential, request id, forwarded-for)
//!     → client.rs (build URL, execute against the backend)
//!     → normalize.rs (unwrap the backend envelope, map errors)
//!     → Envelope { status, mode: real, body }
//! ```
//!
//! # Design Decisions
//! - Handlers only describe the call; transport and normalization are shared
//! - The `Upstream` trait is the seam tests substitute
//! - Non-2xx upstream statuses pass through untouched

pub mod client;
pub mod normalize;
pub mod pipeline;

pub use client::{HttpUpstream, TransportError, Upstream, UpstreamRequest, UpstreamResponse};
pub use pipeline::Caller;
