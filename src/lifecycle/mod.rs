//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind → Serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → resolve the server's shutdown future
//!
//! Shutdown (shutdown.rs):
//!     Stop accepting → end event streams → drain connections → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
