//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → gate.rs (static / public / credential check, 401 or sign-in redirect)
//!     → route handler
//!         → credentials.rs (resolve bearer token for the upstream call)
//! ```
//!
//! # Design Decisions
//! - Fail closed: protected API paths without a credential never reach a handler
//! - Token presence only; validation belongs to the upstream
//! - Tokens never appear in logs

pub mod credentials;
pub mod gate;
