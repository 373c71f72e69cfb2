use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment overrides, e.g. `PORTFOLIO_ASSISTANT_SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "PORTFOLIO_ASSISTANT";

/// Vault name variable read by earlier deployments of the assistant
pub const VAULT_NAME_ENV: &str = "AZURE_KEY_VAULT_NAME";

/// Fallback key for the public provider when the vault has none
pub const FALLBACK_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub service: ServiceConfig,
    pub vault: VaultConfig,
    pub relay: RelayConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// `text` or `json`
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Reported by `/health` and shown on the index page
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "Azure Portfolio Assistant".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Key Vault name; the vault URL is derived from it
    pub name: Option<String>,
    /// Explicit vault URL, takes precedence over `name`
    pub url: Option<String>,
    pub api_version: String,
    pub timeout_seconds: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            name: None,
            url: None,
            api_version: "7.4".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl VaultConfig {
    /// Resolve the vault base URL, if any vault is configured
    pub fn vault_url(&self) -> Option<String> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Some(url.trim_end_matches('/').to_string());
        }

        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|name| format!("https://{}.vault.azure.net", name))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Azure OpenAI deployment used by the managed provider
    pub deployment: String,
    /// Azure OpenAI `api-version` query parameter
    pub api_version: String,
    /// Model identifier sent to the public provider
    pub model: String,
    pub max_tokens: u32,
    pub public_base_url: String,
    pub managed_key_secret: String,
    pub managed_endpoint_secret: String,
    pub public_key_secret: String,
    /// Used when the vault yields no public key
    pub fallback_api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            deployment: "gpt-35-turbo".to_string(),
            api_version: "2023-12-01-preview".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            public_base_url: "https://api.openai.com/v1".to_string(),
            managed_key_secret: "azure-openai-key".to_string(),
            managed_endpoint_secret: "azure-openai-endpoint".to_string(),
            public_key_secret: "openai-api-key".to_string(),
            fallback_api_key: None,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "/metrics".to_string(),
        }
    }
}

/// Load configuration: defaults, then the optional TOML file, then
/// `PORTFOLIO_ASSISTANT_*` environment variables.
///
/// `AZURE_KEY_VAULT_NAME` and `OPENAI_API_KEY` are honoured as low-priority
/// defaults so existing deployments keep working without a config file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let mut builder = config::Config::builder();

    if let Ok(name) = std::env::var(VAULT_NAME_ENV) {
        builder = builder.set_default("vault.name", name)?;
    }
    if let Ok(key) = std::env::var(FALLBACK_KEY_ENV) {
        builder = builder.set_default("relay.fallback_api_key", key)?;
    }

    let config = builder
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

/// Paths served by the relay itself
const RESERVED_ROUTES: [&str; 3] = ["/", "/ask", "/health"];

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        anyhow::bail!("server.port must be non-zero");
    }

    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("Invalid log format '{}': expected 'text' or 'json'", other),
    }

    let relay = &cfg.relay;
    if relay.max_tokens == 0 {
        anyhow::bail!("relay.max_tokens must be greater than zero");
    }
    if relay.deployment.trim().is_empty() {
        anyhow::bail!("relay.deployment cannot be empty");
    }
    if relay.model.trim().is_empty() {
        anyhow::bail!("relay.model cannot be empty");
    }
    if relay.public_base_url.trim().is_empty() {
        anyhow::bail!("relay.public_base_url cannot be empty");
    }
    if relay.timeout_seconds == 0 {
        anyhow::bail!("relay.timeout_seconds must be greater than zero");
    }
    if cfg.vault.timeout_seconds == 0 {
        anyhow::bail!("vault.timeout_seconds must be greater than zero");
    }

    for (field, secret) in [
        ("managed_key_secret", &relay.managed_key_secret),
        ("managed_endpoint_secret", &relay.managed_endpoint_secret),
        ("public_key_secret", &relay.public_key_secret),
    ] {
        if secret.trim().is_empty() {
            anyhow::bail!("relay.{} cannot be empty", field);
        }
    }

    if cfg.metrics.enabled {
        let endpoint = cfg.metrics.endpoint.as_str();
        if !endpoint.starts_with('/') {
            anyhow::bail!("metrics.endpoint must start with '/'");
        }
        if RESERVED_ROUTES.contains(&endpoint) {
            anyhow::bail!("metrics.endpoint '{}' conflicts with a built-in route", endpoint);
        }
    }

    Ok(())
}
