use crate::{
    config::RelayConfig,
    error::AppError,
    metrics,
    models::{ChatReply, ChatRequest},
    provider,
    secrets::SecretResolver,
    upstream,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared by the relay handlers
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayConfig>,
    pub service_name: Arc<str>,
    pub http_client: reqwest::Client,
    pub secrets: SecretResolver,
    pub templates: Arc<tera::Tera>,
}

/// Handle `POST /ask`
///
/// Validates the message, picks a provider from the resolved secrets, makes
/// one completion call and returns `{"response": ...}`.
pub async fn handle_ask(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    match relay(&state, payload).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            metrics::record_error(e.kind());
            tracing::warn!(kind = e.kind(), error = %e, "Ask request failed");
            Err(e)
        }
    }
}

async fn relay(
    state: &AppState,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<ChatReply, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let message = request
        .message()
        .ok_or_else(|| AppError::InvalidInput("No message provided".to_string()))?;

    let provider = provider::select_provider(&state.secrets, &state.relay).await?;
    let upstream_request = provider.build_request(&state.relay, message);

    tracing::info!(
        provider = provider.name(),
        message_chars = message.chars().count(),
        "Relaying chat message"
    );
    metrics::record_request(provider.name());

    let start = Instant::now();
    let body = upstream::chat_completions(
        &state.http_client,
        &upstream_request,
        Duration::from_secs(state.relay.timeout_seconds),
    )
    .await?;
    metrics::record_duration(provider.name(), start.elapsed());

    let response = upstream::extract_reply(&body)?;

    tracing::info!(
        provider = provider.name(),
        duration_ms = start.elapsed().as_millis() as u64,
        completion_tokens = body.usage.as_ref().map(|u| u.completion_tokens),
        "Completed chat relay"
    );

    Ok(ChatReply { response })
}
