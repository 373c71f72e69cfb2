use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    config::Config,
    handlers::{self, AppState},
    metrics,
    secrets::{DefaultCredential, KeyVaultStore, SecretResolver, SecretStore, StaticSecretStore},
    signals::shutdown_signal,
};

/// Chat messages are short; anything larger is rejected before parsing
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Start the assistant server
///
/// This function:
/// 1. Initializes metrics (if enabled)
/// 2. Builds the secret store and shared state
/// 3. Binds to the configured address
/// 4. Serves requests until SIGTERM/SIGINT, then drains connections
pub async fn start_server(config: Config) -> Result<()> {
    let metrics_route = if config.metrics.enabled {
        info!("Initializing Prometheus metrics...");
        Some((config.metrics.endpoint.clone(), Arc::new(metrics::init_metrics()?)))
    } else {
        None
    };

    let http_client = reqwest::Client::new();
    let app_state = build_state(&config, http_client)?;

    let app = create_router(app_state, metrics_route);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting {} on {}", config.service.name, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Assemble the handler state from configuration
pub fn build_state(config: &Config, http_client: reqwest::Client) -> Result<AppState> {
    let store = build_secret_store(config, &http_client);
    let templates = handlers::index::load_templates()?;

    Ok(AppState {
        relay: Arc::new(config.relay.clone()),
        service_name: Arc::from(config.service.name.as_str()),
        http_client,
        secrets: SecretResolver::new(store),
        templates: Arc::new(templates),
    })
}

/// Key Vault store when a vault is configured, otherwise an empty static store
pub fn build_secret_store(config: &Config, http_client: &reqwest::Client) -> Arc<dyn SecretStore> {
    let timeout = Duration::from_secs(config.vault.timeout_seconds);

    match config.vault.vault_url() {
        Some(vault_url) => {
            let credential = DefaultCredential::from_env(http_client.clone(), timeout);
            info!(
                vault_url = %vault_url,
                credentials = ?credential.source_names(),
                "Using Azure Key Vault for provider credentials"
            );

            Arc::new(KeyVaultStore::new(
                http_client.clone(),
                vault_url,
                config.vault.api_version.clone(),
                Arc::new(credential),
                timeout,
            ))
        }
        None => {
            warn!("No key vault configured; only the environment fallback key is available");
            Arc::new(StaticSecretStore::new())
        }
    }
}

/// Create the Axum router with all routes and middleware
pub fn create_router(
    app_state: AppState,
    metrics_route: Option<(String, Arc<PrometheusHandle>)>,
) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::index::index))
        .route("/ask", post(handlers::ask::handle_ask))
        .route("/health", get(handlers::health::health_check))
        .with_state(app_state);

    if let Some((endpoint, handle)) = metrics_route {
        router = router.merge(
            Router::new()
                .route(&endpoint, get(handlers::metrics_handler::metrics))
                .with_state(handle),
        );
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}
