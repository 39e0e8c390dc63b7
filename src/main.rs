//! Broadside Game Server
//!
//! Binary entry point: reads configuration from the environment, wires the
//! HTTP score collaborator, and runs the WebSocket server until shutdown.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use broadside::network::server::{GameServer, ServerConfig};
use broadside::score::HttpScoreReporter;
use broadside::VERSION;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    info!("Broadside Server v{}", VERSION);
    info!("Listening on {}", config.bind_addr);
    info!("Score collaborator: {}", config.score_api_url);

    let reporter = Arc::new(HttpScoreReporter::new(&config.score_api_url));
    let server = GameServer::new(config, reporter);

    server.run().await.context("server terminated")?;
    Ok(())
}
