//! fetch-relay
//!
//! Forwards every request to a single upstream and streams the answer back.
//!
//! ```text
//!   Client ──▶ axum handler ──▶ project (blocklist) ──▶ hyper-util client ──▶ Upstream
//!   Client ◀── ResponseTarget ◀── relay (blocklist) ◀────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use fetch_relay::config::{load_config, RelayConfig};
use fetch_relay::observability::init_logging;
use fetch_relay::HttpServer;

/// Header-filtering HTTP relay.
#[derive(Debug, Parser)]
#[command(name = "fetch-relay", version, about)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override upstream.base_url.
    #[arg(long)]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(upstream) = cli.upstream {
        config.upstream.base_url = upstream;
    }

    init_logging(&config.observability);

    tracing::info!("fetch-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
