use anyhow::Result;
use colored::Colorize;
use portfolio_assistant::{config::Config, server};
use tracing::info;

/// Execute the start command: serve until a shutdown signal arrives
pub async fn execute(cfg: Config) -> Result<()> {
    println!(
        "{} {}:{}",
        "Starting assistant on".green(),
        cfg.server.host,
        cfg.server.port
    );
    info!(service = %cfg.service.name, "Starting in foreground mode");

    server::start_server(cfg).await
}
