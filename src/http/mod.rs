//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack, auth gate)
//!     → request.rs (request ID, tracing span, paging query)
//!     → extract.rs (query/path extraction, rejections as envelopes)
//!     → routes/* handler wrapped by boundary.rs
//!     → response.rs (Envelope: status, mode header, JSON body)
//!     → error.rs (GatewayError → envelope with dialog)
//!     → Send to client
//! ```

pub mod boundary;
pub mod error;
pub mod extract;
pub mod request;
pub mod response;
pub mod server;

pub use error::{GatewayError, GatewayResult};
pub use request::X_REQUEST_ID;
pub use response::{Envelope, Mode, X_MODE};
pub use server::{AppState, HttpServer};
