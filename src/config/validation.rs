//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream URL and value ranges (timeouts > 0)
//! - Check cookie and path settings are usable as written
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::new(
                    "upstream.base_url",
                    "must not carry a query or fragment",
                ));
            }
        }
        Ok(url) => errors.push(ValidationError::new(
            "upstream.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }

    let cookie = &config.auth.cookie_name;
    if cookie.is_empty() {
        errors.push(ValidationError::new("auth.cookie_name", "must not be empty"));
    } else if cookie
        .chars()
        .any(|c| c.is_whitespace() || c == ';' || c == '=' || c == ',')
    {
        errors.push(ValidationError::new(
            "auth.cookie_name",
            format!("'{}' is not a valid cookie name", cookie),
        ));
    }

    if config.auth.cookie_max_age_secs <= 0 {
        errors.push(ValidationError::new("auth.cookie_max_age_secs", "must be positive"));
    }

    for (field, path) in [
        ("auth.sign_in_path", &config.auth.sign_in_path),
        ("auth.default_redirect", &config.auth.default_redirect),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must be an absolute path"));
        }
    }

    if config.upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.request_timeout_secs", "must be > 0"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "ftp://files.example.com".into();
        config.auth.cookie_name = "bad name".into();
        config.auth.sign_in_path = "auth/sign-in".into();
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "upstream.base_url",
                "auth.cookie_name",
                "auth.sign_in_path",
                "timeouts.request_secs"
            ]
        );
    }
}
