use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use trinnov_core::PlatformConfig;
use trinnov_host::{Bridge, BridgeConfig, run_platform};
use trinnov_platform::TrinnovPlatform;

mod cli;

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_tracing(args.debug);

    let config = PlatformConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    info!(
        "trinnov-bridge {} for \"{}\" ({})",
        trinnov_platform::VERSION,
        config.name,
        config.mac_address
    );

    let bridge_config = match &args.storage {
        Some(dir) => BridgeConfig::with_storage_dir(dir),
        None => BridgeConfig::default(),
    };
    if let Some(path) = &bridge_config.cache_path {
        info!("Accessory cache: {}", path.display());
    }

    let (bridge, events) = Bridge::new(bridge_config);
    let mut platform = TrinnovPlatform::new(bridge.clone(), config);

    let signal_bridge = bridge.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down");
                if let Err(e) = signal_bridge.shutdown() {
                    warn!("Failed to save accessory cache: {}", e);
                }
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    bridge.start().context("failed to start bridge")?;
    run_platform(&mut platform, events)
        .await
        .context("platform failed to launch")?;

    info!("Bridge stopped");
    Ok(())
}
