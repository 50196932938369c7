//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the upstream base URL.
pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
/// Legacy alias of [`ENV_API_BASE_URL`] kept for existing deployments.
pub const ENV_API_BASE_URL_ALIAS: &str = "NEXT_PUBLIC_API_BASE_URL";
pub const ENV_USE_MOCK: &str = "USE_MOCK";
pub const ENV_AUTH_COOKIE_NAME: &str = "AUTH_COOKIE_NAME";
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from a TOML file without validating it.
pub fn load_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto a configuration.
///
/// `lookup` abstracts `std::env::var` so tests can supply a fixed environment.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = lookup(ENV_API_BASE_URL)
        .or_else(|| lookup(ENV_API_BASE_URL_ALIAS))
        .filter(|v| !v.trim().is_empty());
    if let Some(url) = base_url {
        config.upstream.base_url = url.trim().to_string();
    }

    if let Some(flag) = lookup(ENV_USE_MOCK) {
        config.mock.enabled = flag.trim().eq_ignore_ascii_case("true");
    }

    if let Some(name) = lookup(ENV_AUTH_COOKIE_NAME).filter(|v| !v.trim().is_empty()) {
        config.auth.cookie_name = name.trim().to_string();
    }

    if let Some(addr) = lookup(ENV_BIND_ADDRESS).filter(|v| !v.trim().is_empty()) {
        config.listener.bind_address = addr.trim().to_string();
    }
}

/// Strip trailing slashes so URL joins never produce `//api`.
pub fn normalize(config: &mut GatewayConfig) {
    let trimmed = config.upstream.base_url.trim_end_matches('/').to_string();
    config.upstream.base_url = trimmed;
}

/// Resolve the effective configuration: defaults, optional file, environment,
/// then normalization and validation.
pub fn resolve<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => load_file(p)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, lookup);
    normalize(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    resolve(Some(path), |_| None)
}
