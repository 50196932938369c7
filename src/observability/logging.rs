//! Structured logging.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber once at startup
//! - Pick pretty or JSON output from configuration
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Installing twice is not an error (tests may race to initialize)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

/// Default directives when neither `RUST_LOG` nor the config names a level.
const DEFAULT_DIRECTIVES: &str = "docgate=info,tower_http=info";

/// Build the level filter for `config`.
pub fn filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = if config.log_level.trim().is_empty() {
            DEFAULT_DIRECTIVES.to_string()
        } else {
            format!("docgate={level},tower_http={level}", level = config.log_level.trim())
        };
        EnvFilter::new(directives)
    })
}

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(filter(config));

    let result = if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(err) = result {
        eprintln!("tracing subscriber already installed: {err}");
    }
}
