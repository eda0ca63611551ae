//! flarewatch - self-hosted uptime monitor with debounced notifications.
//!
//! Probes configured HTTP/TCP targets on a schedule, keeps a bounded latency
//! history and incident ledger per target, and notifies Apprise or webhook
//! channels on up/down transitions.

mod config;
mod db;
mod notify;
mod probe;
mod scheduler;
mod state;

use config::{ServerConfig, WatchConfig};
use db::Store;
use scheduler::Scheduler;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flarewatch=info".parse()?),
        )
        .init();

    // Load configuration
    let server_cfg = ServerConfig::load();
    let watch_cfg = Arc::new(WatchConfig::from_file(&server_cfg.config_path)?);
    tracing::info!(
        "Starting flarewatch with {} monitors and {} notification channels...",
        watch_cfg.monitors.len(),
        watch_cfg.notifications.len()
    );
    tracing::info!("Using database at {}", server_cfg.db_path);

    // Initialize state store
    let store = Arc::new(Store::new(&server_cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    // Start the check-cycle scheduler
    let scheduler = Scheduler::new(watch_cfg, store);
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    scheduler.stop().await;

    Ok(())
}
