//! shallot-daemon: run a registry, relays and users on one host.

use shallot_daemon::{launch_network, DaemonConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DaemonConfig::load()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Shallot daemon starting");

    let network = launch_network(&config).await?;

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");

    network.shutdown().await;
    Ok(())
}
