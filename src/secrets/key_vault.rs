use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{SecretError, SecretStore, TokenCredential};

/// OAuth scope for the Key Vault data plane
pub const VAULT_SCOPE: &str = "https://vault.azure.net/.default";

#[derive(Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

/// Azure Key Vault secrets, read over the REST API.
///
/// GET `{vault_url}/secrets/{name}?api-version={version}` with a bearer token.
/// A token is acquired for every lookup.
pub struct KeyVaultStore {
    client: Client,
    vault_url: String,
    api_version: String,
    credential: Arc<dyn TokenCredential>,
    timeout: Duration,
}

impl KeyVaultStore {
    pub fn new(
        client: Client,
        vault_url: impl Into<String>,
        api_version: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            vault_url: vault_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
            credential,
            timeout,
        }
    }

    pub fn vault_url(&self) -> &str {
        &self.vault_url
    }
}

#[async_trait]
impl SecretStore for KeyVaultStore {
    fn name(&self) -> &str {
        "key_vault"
    }

    async fn get_secret(&self, name: &str) -> Result<Option<String>, SecretError> {
        let token = self.credential.get_token(VAULT_SCOPE).await?;
        let url = format!("{}/secrets/{}", self.vault_url, name);

        let response = self
            .client
            .get(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SecretError::Vault { status, message });
        }

        let bundle: SecretBundle = response.json().await?;
        Ok(bundle.value)
    }
}
