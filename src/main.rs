//! Shadowing reverse proxy.
//!
//! ```text
//!                    ┌──────────────────────────────────────────┐
//!                    │               SHADOW PROXY               │
//!   Client Request   │  ┌────────┐    ┌──────────┐   ┌────────┐ │
//!   ─────────────────┼─▶│ server │───▶│ pipeline │──▶│primary │─┼──▶ Backend A
//!                    │  └────────┘    │  (join)  │──▶│ shadow │─┼──▶ Backend B
//!   Client Response  │       ▲        └────┬─────┘   └────────┘ │
//!   ◀────────────────┼───────┘ A's response│                    │
//!                    │                     ▼ (detached)         │
//!                    │   compare → stats + metrics + replay log │
//!                    └──────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use shadow_proxy::config::{load_config, ProxyConfig};
use shadow_proxy::lifecycle::{wait_for_signal, Shutdown};
use shadow_proxy::observability::{logging, metrics};
use shadow_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "shadow-proxy")]
#[command(about = "Duplicate traffic to a primary and a shadow backend and compare responses", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!("shadow-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        primary = %config.backends.primary,
        shadow = %config.backends.shadow,
        routes = config.routes.path_patterns.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
