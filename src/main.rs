//! docgate: backend-for-frontend gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                   GATEWAY                    │
//!     Browser          │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!     ─────────────────┼─▶│ auth gate│──▶│  routes  │──▶│  proxy   │──┼──▶ Backend API
//!                      │  └──────────┘   └────┬─────┘   └──────────┘  │
//!                      │                      │ mock mode             │
//!                      │                      ▼                       │
//!                      │                ┌──────────┐                  │
//!                      │                │ fixtures │                  │
//!                      │                └──────────┘                  │
//!                      │  config · observability · lifecycle          │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use docgate::config::loader;
use docgate::http::HttpServer;
use docgate::lifecycle::signals;
use docgate::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "docgate")]
#[command(about = "Backend-for-frontend gateway for the document management UI", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "DOCGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Serve fixtures instead of calling the backend.
    #[arg(long)]
    mock: bool,

    /// Listen address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = loader::resolve(cli.config.as_deref(), |key| std::env::var(key).ok())?;
    if cli.mock {
        config.mock.enabled = true;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = %config.mode(),
        bind_address = %config.listener.bind_address,
        upstream = %config.backend_base_url(),
        "docgate starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(err) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %err,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;
    server.run(listener, signals::termination()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
