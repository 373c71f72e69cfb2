use colored::Colorize;
use portfolio_assistant::{
    config::Config,
    logging::MaskedSecret,
    secrets::SecretResolver,
    server,
};

/// Execute the secret command
///
/// Resolves one secret the same way the relay does and reports whether it was
/// found. The value is never printed in full.
pub async fn execute(cfg: &Config, name: &str) {
    let store = server::build_secret_store(cfg, &reqwest::Client::new());
    let resolver = SecretResolver::new(store);

    println!(
        "{} '{}' via {}...",
        "Resolving".yellow(),
        name,
        resolver.store_name()
    );

    match resolver.resolve(name).await {
        Some(value) => println!("{} {}", "✓ Found:".green(), MaskedSecret::new(&value)),
        None => println!(
            "{}",
            "✗ Not resolved (missing, empty, or vault unreachable; see logs)".red()
        ),
    }
}
