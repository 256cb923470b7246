//! Reef multiplayer game server.

use reef_server::{server, RoomCoordinator, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often closed matches are swept from the registry
const REAP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    info!(?config, "Starting Reef server...");

    let coordinator = Arc::new(RoomCoordinator::new(config.match_settings()));

    let reaper = Arc::clone(&coordinator);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REAP_INTERVAL);
        loop {
            ticker.tick().await;
            reaper.reap_closed();
        }
    });

    tokio::select! {
        result = server::run_server(config.addr, Arc::clone(&coordinator)) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            coordinator.shutdown().await;
            Ok(())
        }
    }
}
