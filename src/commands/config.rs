use anyhow::Result;
use colored::Colorize;
use portfolio_assistant::{config::Config, logging::MaskedSecret};
use tracing::info;

/// Execute the config show command
///
/// Displays the effective configuration with secrets masked
pub fn show(cfg: &Config) -> Result<()> {
    let sanitized = sanitize_secrets(cfg);

    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(&sanitized)?;
    println!("{}", toml_string);

    info!("Configuration displayed successfully");
    Ok(())
}

/// Mask credential material for safe display
fn sanitize_secrets(cfg: &Config) -> Config {
    let mut sanitized = cfg.clone();

    if let Some(key) = &cfg.relay.fallback_api_key {
        sanitized.relay.fallback_api_key = Some(MaskedSecret::new(key).to_string());
    }

    sanitized
}
