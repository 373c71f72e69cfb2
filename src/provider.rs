//! Provider selection and request assembly
//!
//! The managed (Azure OpenAI) provider is used whenever both of its secrets
//! resolve; otherwise the relay falls back to the public OpenAI endpoint.

use std::fmt;

use crate::{
    config::RelayConfig,
    error::AppError,
    logging::MaskedSecret,
    models::{ChatCompletionRequest, ChatMessage},
    secrets::SecretResolver,
};

/// Completion provider chosen for one request
#[derive(Clone, PartialEq, Eq)]
pub enum Provider {
    /// Azure OpenAI: tenant endpoint, `api-key` header
    Managed { key: String, endpoint: String },
    /// api.openai.com (or compatible): bearer credential
    Public { key: String },
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Managed { key, endpoint } => f
                .debug_struct("Managed")
                .field("key", &MaskedSecret::new(key).to_string())
                .field("endpoint", endpoint)
                .finish(),
            Self::Public { key } => f
                .debug_struct("Public")
                .field("key", &MaskedSecret::new(key).to_string())
                .finish(),
        }
    }
}

/// Fully assembled outbound call
#[derive(Clone)]
pub struct UpstreamRequest {
    pub url: String,
    pub auth_header: (&'static str, String),
    pub body: ChatCompletionRequest,
}

impl fmt::Debug for UpstreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, value) = &self.auth_header;
        f.debug_struct("UpstreamRequest")
            .field("url", &self.url)
            .field("auth_header", &(name, MaskedSecret::new(value).to_string()))
            .field("body", &self.body)
            .finish()
    }
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Managed { .. } => "managed",
            Self::Public { .. } => "public",
        }
    }

    /// Build the single-message completion request for this provider
    pub fn build_request(&self, relay: &RelayConfig, message: &str) -> UpstreamRequest {
        let messages = vec![ChatMessage::user(message)];

        match self {
            Self::Managed { key, endpoint } => UpstreamRequest {
                url: format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    endpoint.trim_end_matches('/'),
                    relay.deployment,
                    relay.api_version
                ),
                auth_header: ("api-key", key.clone()),
                body: ChatCompletionRequest {
                    model: None,
                    messages,
                    max_tokens: Some(relay.max_tokens),
                    temperature: None,
                },
            },
            Self::Public { key } => UpstreamRequest {
                url: format!(
                    "{}/chat/completions",
                    relay.public_base_url.trim_end_matches('/')
                ),
                auth_header: ("Authorization", format!("Bearer {}", key)),
                body: ChatCompletionRequest {
                    model: Some(relay.model.clone()),
                    messages,
                    max_tokens: Some(relay.max_tokens),
                    temperature: None,
                },
            },
        }
    }
}

/// Managed provider if both its key and endpoint are present
pub fn select_managed(key: Option<String>, endpoint: Option<String>) -> Option<Provider> {
    match (key, endpoint) {
        (Some(key), Some(endpoint)) => Some(Provider::Managed { key, endpoint }),
        _ => None,
    }
}

/// Public provider, keyed from the vault first and the fallback second
pub fn select_public(
    vault_key: Option<String>,
    fallback: Option<&str>,
) -> Result<Provider, AppError> {
    vault_key
        .or_else(|| {
            fallback
                .filter(|k| !k.trim().is_empty())
                .map(str::to_string)
        })
        .map(|key| Provider::Public { key })
        .ok_or_else(|| {
            AppError::MissingCredential("no API key available for the public provider".to_string())
        })
}

/// Resolve secrets and pick the provider for one request.
///
/// The public key is only looked up when the managed provider is unavailable.
pub async fn select_provider(
    resolver: &SecretResolver,
    relay: &RelayConfig,
) -> Result<Provider, AppError> {
    let managed_key = resolver.resolve(&relay.managed_key_secret).await;
    let managed_endpoint = resolver.resolve(&relay.managed_endpoint_secret).await;

    if managed_key.is_some() != managed_endpoint.is_some() {
        tracing::warn!(
            key_present = managed_key.is_some(),
            endpoint_present = managed_endpoint.is_some(),
            "Managed provider partially configured, falling back to public provider"
        );
    }

    if let Some(provider) = select_managed(managed_key, managed_endpoint) {
        return Ok(provider);
    }

    let vault_key = resolver.resolve(&relay.public_key_secret).await;
    if vault_key.is_none() && relay.fallback_api_key.is_some() {
        tracing::debug!("Public provider key taken from environment fallback");
    }

    select_public(vault_key, relay.fallback_api_key.as_deref())
}
