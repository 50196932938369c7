//! Backend-for-frontend gateway for the document management UI.

pub mod config;
pub mod fixtures;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routes;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
