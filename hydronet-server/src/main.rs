//! hydronet server - shortest paths and route checks over a branch/node network.
//!
//! The network is loaded once at startup and shared read-only between
//! requests.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /network` - Network summary
//! - `POST /shortest-path` - Shortest walk between two branch locations
//! - `POST /route` - Route through several locations with validation flags

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use clap::Parser;
use hydronet_core::{NetworkConfig, create_network};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;

use config::ServerConfig;
use routes::{AppState, router};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// GeoJSON network file, overrides the configured one.
    #[arg(long)]
    network: Option<PathBuf>,

    /// Address to listen on, overrides the configured one.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig, config::ConfigError> {
        let mut config = match (&self.config, &self.network) {
            (Some(path), _) => ServerConfig::from_file(path)?,
            (None, Some(network)) => ServerConfig::new(NetworkConfig::new(network)),
            (None, None) => {
                return Err(config::ConfigError::Invalid(
                    "Either --config or --network is required".to_string(),
                ));
            }
        };

        if let Some(network) = self.network {
            config.network.path = network;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        Ok(config)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Args::parse().into_config()?;

    tracing::info!(
        bind = %config.bind,
        network = %config.network.path.display(),
        request_timeout_secs = config.request_timeout_secs,
        concurrency_limit = config.concurrency_limit,
        "Starting hydronet server"
    );

    let network_config = config.network.clone();
    let network = tokio::task::spawn_blocking(move || create_network(&network_config)).await??;
    tracing::info!(
        name = %network.name,
        nodes = network.node_count(),
        branches = network.branch_count(),
        "Network loaded"
    );

    let state = AppState {
        network: Arc::new(network),
    };

    let app = router(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(error::handle_middleware_error))
                .concurrency_limit(config.concurrency_limit)
                .timeout(Duration::from_secs(config.request_timeout_secs)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
