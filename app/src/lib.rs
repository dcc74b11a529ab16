//! Swapgate server application library

use std::path::PathBuf;

use anyhow::Context;
use swapgate_api::{start_server, AppState};
use swapgate_core::AppConfig;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV: &str = "SWAPGATE_CONFIG";

/// Load the config named by [`CONFIG_ENV`], or the defaults when unset
pub fn load_config() -> anyhow::Result<AppConfig> {
    match std::env::var_os(CONFIG_ENV).map(PathBuf::from) {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            AppConfig::from_json_file(&path)
                .with_context(|| format!("invalid config {}", path.display()))
        }
        None => {
            tracing::info!("{} not set, using default config", CONFIG_ENV);
            Ok(AppConfig::default())
        }
    }
}

/// Run the Swapgate server
pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("swapgate=debug".parse()?)
                .add_directive("swap_engine=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    tracing::info!("Starting Swapgate");

    let config = load_config()?;
    let port = config.api_port;
    let state = AppState::with_config(config).context("failed to build engine")?;

    start_server(state, port)
        .await
        .with_context(|| format!("API server on port {} failed", port))
}
