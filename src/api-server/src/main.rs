//! Warden authorization server
//!
//! Serves HTTP resources behind the authorization middleware, plus admin
//! endpoints for managing grants and role assignments at runtime.
//!
//! # Usage
//!
//! ```bash
//! WARDEN_POLICY=policy.csv PORT=8080 warden-server
//!
//! # Enable debug logging, including every allow/deny decision
//! RUST_LOG=debug warden-server
//! ```
//!
//! See [`warden_api_server::config`] for the full list of environment variables.

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_api_server::{config::ServerConfig, server::Server};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Warden authorization server v{}", warden_authz::VERSION);

    let config = ServerConfig::from_env();
    info!(
        bind = %config.bind_address(),
        model = ?config.model_path,
        policy = ?config.policy_path,
        principal_header = ?config.principal_header,
        "Configuration loaded"
    );

    let server = Server::from_config(config).map_err(|e| {
        error!("Failed to initialize server: {:#}", e);
        e
    })?;

    server.run().await
}
