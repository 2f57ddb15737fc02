use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use compass_common::observability::{LogConfig, init_logging};
use compass_config::CompassConfigLoader;
use compass_server::app::{build_router, state_from_config};

#[derive(Parser, Debug)]
#[command(name = "compass-server", about = "Post classification and scoring service")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "compass.yaml")]
    config: PathBuf,

    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = init_logging(LogConfig {
        app_name: "compass-server",
        emit_stderr: true,
        ..LogConfig::default()
    })?;
    tracing::info!(log_path = %log_path.display(), "compass.logging_ready");

    let config = CompassConfigLoader::new().with_file(&cli.config).load()?;
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());

    let (state, cors) = state_from_config(&config)?;
    let app = build_router(state, cors);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "compass.server.listening");
    axum::serve(listener, app).await?;
    Ok(())
}
