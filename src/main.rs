use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use sensor_gateway::{AppState, ServerConfig, init, routes};

/// Control-plane gateway for hardware/sensor management
#[derive(Parser, Debug)]
#[command(name = "sensor-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServerConfig::from_env().context("loading config from environment")?,
    };

    let state = AppState::new(config);
    init::register_configured_plugins(&state.config, &state.registry);

    let app = routes::create_api_router().with_state(state.clone());
    let listener = TcpListener::bind(state.config.address())
        .await
        .with_context(|| format!("binding {}", state.config.address()))?;

    info!(address = %state.config.address(), "Gateway listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
