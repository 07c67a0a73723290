//! PROXIMA hub entry point

use tracing_subscriber::EnvFilter;

use proxima_core::{HubConfig, HubResult};
use proxima_runtime::Hub;

#[tokio::main]
async fn main() -> HubResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "proxima.toml".to_string());
    let config = HubConfig::load(&config_path)?;

    tracing::info!(
        udp = %config.network.udp_addr(),
        curve = ?config.volume.curve_type,
        broadcast_ms = config.broadcast.interval_ms,
        stale_s = config.system.stale_timeout_s,
        "PROXIMA hub starting"
    );

    let hub = Hub::new(config);
    let handle = hub.start().await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| proxima_core::HubError::Transport(e.to_string()))?;
    tracing::info!("shutdown signal received");

    handle.stop().await;
    Ok(())
}
