//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (GatewayConfig::default)
//!     → loader.rs (optional TOML file)
//!     → loader.rs (environment overrides: API_BASE_URL, USE_MOCK, ...)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to every handler through AppState
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup; handlers never read the environment
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::GatewayConfig;
pub use schema::{AuthConfig, ListenerConfig, MockConfig, UpstreamConfig};
