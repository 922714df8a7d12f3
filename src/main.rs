//! Relay Gateway
//!
//! A small request gateway built with Tokio and Axum: a source-address
//! allowlist and a bearer token in front of a streaming generative-content
//! relay, a paginated forum scraper, and a speech endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌────────────────────────────────────────────────────┐
//!                          │                   RELAY GATEWAY                    │
//!                          │                                                    │
//!     Client Request       │  ┌───────────┐   ┌───────────┐   ┌─────────────┐   │
//!     ─────────────────────┼─▶│ admission │──▶│  bearer   │──▶│   routes    │   │
//!                          │  │ (CIDR)    │   │  auth     │   │             │   │
//!                          │  └─────┬─────┘   └───────────┘   └──────┬──────┘   │
//!                          │        │ /robots.txt (exempt)           │          │
//!                          │        ▼                                ▼          │
//!                          │   robots.txt      ┌──────────┬──────────┬───────┐  │
//!                          │                   │  proxy   │  scrape  │  tts  │  │
//!                          │                   │ (stream) │ (paged)  │       │  │
//!                          │                   └────┬─────┴────┬─────┴───┬───┘  │
//!                          └────────────────────────┼──────────┼─────────┼──────┘
//!                                                   ▼          ▼         ▼
//!                                              upstream     forum    synthesizer
//!                                                 API       pages    + transcoder
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use relay_gateway::config::resolve_config;
use relay_gateway::http::GatewayServer;
use relay_gateway::lifecycle::{signals, startup, Shutdown};
use relay_gateway::net::tls::load_tls_config;
use relay_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "relay-gateway")]
#[command(about = "Allowlisted, token-protected relay and scraping gateway", long_about = None)]
struct Args {
    /// Path to a TOML config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref())?;
    logging::init_logging(&config.observability);

    tracing::info!("relay-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    startup::announce(&config);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let _signals = signals::spawn_signal_listener(Arc::clone(&shutdown));

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = GatewayServer::new(config)?;

    match tls {
        Some(tls) => {
            let tls_config = load_tls_config(&tls).await?;
            let addr = bind_address.parse()?;
            server.run_tls(addr, tls_config, server_shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, server_shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
