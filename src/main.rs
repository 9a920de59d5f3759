use std::path::Path;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use glowsync::capture::ScreenSource;
use glowsync::{Config, DeviceScanner, Pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config: Config = glowsync::config::load_json_config(Path::new("glowsync.json"));

    let mut source = ScreenSource::new(config.sample_width, config.sample_height)
        .map_err(anyhow::Error::msg)
        .context("screen capture unavailable")?;

    let scanner = DeviceScanner::bind()
        .await
        .context("failed to bind discovery socket")?;
    let mut pipeline = Pipeline::new(config, scanner);

    let shutdown = pipeline.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            shutdown.stop();
        }
    });

    pipeline.run(&mut source).await?;
    Ok(())
}
