use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use portfolio_assistant::{
    config::{self, Config},
    init_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Logging settings live in the configuration, so tracing starts once it is loaded
    let load = || -> Result<Config> {
        let cfg = config::load_config(&args.config)?;
        init_tracing(&cfg.server.log_level, &cfg.server.log_format);
        Ok(cfg)
    };

    match args.get_command() {
        cli::Commands::Start => commands::start::execute(load()?).await?,
        cli::Commands::Test => commands::test::execute(&load()?),
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&load()?)?,
        },
        cli::Commands::Secret { name } => commands::secret::execute(&load()?, &name).await,
        cli::Commands::Version => {
            println!("Portfolio Assistant v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
