//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::http::response::Mode;

/// Default upstream used when nothing overrides it.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "http://localhost:8080";

/// Default name of the session cookie carrying the bearer token.
pub const DEFAULT_COOKIE_NAME: &str = "access_token";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream backend API.
    pub upstream: UpstreamConfig,

    /// Session cookie and route gate settings.
    pub auth: AuthConfig,

    /// Fixture substitution.
    pub mock: MockConfig,

    /// Static frontend build served for page navigations.
    pub frontend: FrontendConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

impl GatewayConfig {
    /// Provenance tag for responses produced under this configuration.
    pub fn mode(&self) -> Mode {
        if self.mock.enabled {
            Mode::Mock
        } else {
            Mode::Real
        }
    }

    /// Base URL with trailing slashes removed.
    pub fn backend_base_url(&self) -> &str {
        self.upstream.base_url.trim_end_matches('/')
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Upstream backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the backend API, without trailing slash.
    pub base_url: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Whole-request timeout for upstream calls in seconds.
    pub request_timeout_secs: u64,

    /// Answer read-only routes from fixtures when the upstream is unreachable.
    /// Responses produced this way are tagged `x-mode: fallback`.
    pub fallback_to_fixtures: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            fallback_to_fixtures: false,
        }
    }
}

/// Session cookie and route gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Name of the cookie holding the access token.
    pub cookie_name: String,

    /// Cookie lifetime in seconds (24 hours by default).
    pub cookie_max_age_secs: i64,

    /// Mark the session cookie `Secure`.
    pub secure_cookie: bool,

    /// Page unauthenticated navigations are redirected to.
    pub sign_in_path: String,

    /// Where the OAuth callback lands when no `next` is given.
    pub default_redirect: String,

    /// Page paths reachable without a session (exact match).
    pub public_pages: Vec<String>,

    /// API prefixes that bypass the gate entirely.
    pub public_api_prefixes: Vec<String>,

    /// Static asset prefixes that always bypass the gate.
    pub static_prefixes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_max_age_secs: 24 * 60 * 60,
            secure_cookie: false,
            sign_in_path: "/auth/sign-in".to_string(),
            default_redirect: "/dashboard".to_string(),
            public_pages: [
                "/",
                "/auth/sign-in",
                "/auth/sign-up",
                "/auth/verify-email",
                "/auth/forgot-password",
                "/auth/callback",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            public_api_prefixes: vec!["/api/auth".to_string(), "/api/health".to_string()],
            static_prefixes: ["/_next", "/static", "/assets", "/images", "/favicon.ico"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Fixture substitution configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MockConfig {
    /// Answer every API route from in-process fixtures.
    pub enabled: bool,
}

/// Static frontend configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FrontendConfig {
    /// Directory with the built frontend. Page navigations 404 when unset.
    pub static_dir: Option<String>,
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes (uploads included).
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 25 * 1024 * 1024, // 25MB, document uploads
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = GatewayConfig::default();
        assert_eq!(config.backend_base_url(), "http://localhost:8080");
        assert_eq!(config.auth.cookie_name, "access_token");
        assert_eq!(config.auth.cookie_max_age_secs, 86_400);
        assert_eq!(config.mode(), Mode::Real);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            base_url = "https://api.example.com///"

            [mock]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.backend_base_url(), "https://api.example.com");
        assert_eq!(config.mode(), Mode::Mock);
        assert_eq!(config.auth.sign_in_path, "/auth/sign-in");
        assert_eq!(config.timeouts.request_secs, 30);
    }
}
