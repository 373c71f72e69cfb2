//! Secret resolution
//!
//! The relay looks up provider credentials by logical name through a
//! [`SecretStore`]. [`SecretResolver`] wraps a store and downgrades every
//! failure to "absent", logging the cause.

pub mod identity;
pub mod key_vault;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::logging::MaskedSecret;

pub use identity::{
    ClientSecretCredential, DefaultCredential, ManagedIdentityCredential, TokenCredential,
};
pub use key_vault::KeyVaultStore;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Identity error: {0}")]
    Identity(String),

    #[error("Vault returned {status}: {message}")]
    Vault {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Vault request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Backend that can look a secret up by name.
///
/// `Ok(None)` means the store answered and the secret does not exist.
#[async_trait]
pub trait SecretStore: Send + Sync + 'static {
    /// Short backend name for logs
    fn name(&self) -> &str;

    async fn get_secret(&self, name: &str) -> Result<Option<String>, SecretError>;
}

/// In-memory store. Used when no vault is configured, and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    fn name(&self) -> &str {
        "static"
    }

    async fn get_secret(&self, name: &str) -> Result<Option<String>, SecretError> {
        Ok(self.secrets.get(name).cloned())
    }
}

/// Resolves secrets by name, never failing.
#[derive(Clone)]
pub struct SecretResolver {
    store: Arc<dyn SecretStore>,
}

impl SecretResolver {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Current value of `name`, or `None` if it is missing, empty, or the
    /// store could not be reached.
    pub async fn resolve(&self, name: &str) -> Option<String> {
        match self.store.get_secret(name).await {
            Ok(Some(value)) if !value.is_empty() => {
                tracing::debug!(
                    store = self.store.name(),
                    secret = %name,
                    value = %MaskedSecret::new(&value),
                    "Resolved secret"
                );
                Some(value)
            }
            Ok(_) => {
                tracing::debug!(store = self.store.name(), secret = %name, "Secret not found");
                None
            }
            Err(e) => {
                tracing::warn!(
                    store = self.store.name(),
                    secret = %name,
                    error = %e,
                    "Secret lookup failed, treating as absent"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl SecretStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        async fn get_secret(&self, _name: &str) -> Result<Option<String>, SecretError> {
            Err(SecretError::Identity("no credential available".to_string()))
        }
    }

    #[tokio::test]
    async fn test_resolve_present() {
        let store = StaticSecretStore::new().with_secret("azure-openai-key", "abc123");
        let resolver = SecretResolver::new(Arc::new(store));

        assert_eq!(
            resolver.resolve("azure-openai-key").await.as_deref(),
            Some("abc123")
        );
    }

    #[tokio::test]
    async fn test_resolve_missing_is_none() {
        let resolver = SecretResolver::new(Arc::new(StaticSecretStore::new()));
        assert!(resolver.resolve("azure-openai-key").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_empty_value_is_none() {
        let store = StaticSecretStore::new().with_secret("openai-api-key", "");
        let resolver = SecretResolver::new(Arc::new(store));
        assert!(resolver.resolve("openai-api-key").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_swallows_store_errors() {
        let resolver = SecretResolver::new(Arc::new(FailingStore));
        assert!(resolver.resolve("azure-openai-key").await.is_none());
        assert_eq!(resolver.store_name(), "failing");
    }
}
