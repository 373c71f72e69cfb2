//! Azure identity credentials for Key Vault access
//!
//! Tokens are fetched fresh on every call. [`DefaultCredential`] tries an
//! environment-configured service principal first and falls back to the
//! host's managed identity.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::SecretError;

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// Source of OAuth bearer tokens
#[async_trait]
pub trait TokenCredential: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Acquire an access token for `scope` (e.g. `https://vault.azure.net/.default`)
    async fn get_token(&self, scope: &str) -> Result<String, SecretError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Managed identity endpoints take a resource, not a `/.default` scope
fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

async fn fetch_token(request: RequestBuilder, source: &str) -> Result<String, SecretError> {
    let response = request
        .send()
        .await
        .map_err(|e| SecretError::Identity(format!("{} request failed: {}", source, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SecretError::Identity(format!(
            "{} returned {}: {}",
            source, status, body
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| SecretError::Identity(format!("{} returned invalid token: {}", source, e)))?;

    Ok(token.access_token)
}

/// Service principal authenticated with a client secret
pub struct ClientSecretCredential {
    client: Client,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
}

impl ClientSecretCredential {
    pub fn new(
        client: Client,
        authority_host: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            authority_host: authority_host.into().trim_end_matches('/').to_string(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout,
        }
    }

    /// Built from `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET`;
    /// `None` unless all three are set.
    pub fn from_env(client: Client, timeout: Duration) -> Option<Self> {
        let tenant_id = non_empty_env("AZURE_TENANT_ID")?;
        let client_id = non_empty_env("AZURE_CLIENT_ID")?;
        let client_secret = non_empty_env("AZURE_CLIENT_SECRET")?;
        let authority_host = non_empty_env("AZURE_AUTHORITY_HOST")
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());

        Some(Self::new(
            client,
            authority_host,
            tenant_id,
            client_id,
            client_secret,
            timeout,
        ))
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    fn name(&self) -> &str {
        "client_secret"
    }

    async fn get_token(&self, scope: &str) -> Result<String, SecretError> {
        let url = format!("{}/{}/oauth2/v2.0/token", self.authority_host, self.tenant_id);

        let request = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope),
            ]);

        fetch_token(request, self.name()).await
    }
}

#[derive(Debug, Clone)]
enum ManagedIdentityEndpoint {
    /// App Service / Functions local identity endpoint
    AppService { endpoint: String, header: String },
    /// Azure instance metadata service
    Imds { endpoint: String },
}

/// Host-assigned (or user-assigned, with a client id) managed identity
pub struct ManagedIdentityCredential {
    client: Client,
    endpoint: ManagedIdentityEndpoint,
    client_id: Option<String>,
    timeout: Duration,
}

impl ManagedIdentityCredential {
    pub fn imds(client: Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: ManagedIdentityEndpoint::Imds {
                endpoint: endpoint.into(),
            },
            client_id: None,
            timeout,
        }
    }

    pub fn app_service(
        client: Client,
        endpoint: impl Into<String>,
        header: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: ManagedIdentityEndpoint::AppService {
                endpoint: endpoint.into(),
                header: header.into(),
            },
            client_id: None,
            timeout,
        }
    }

    /// Select a user-assigned identity
    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }

    /// App Service endpoint when `IDENTITY_ENDPOINT` and `IDENTITY_HEADER` are
    /// set, otherwise IMDS.
    pub fn from_env(client: Client, timeout: Duration) -> Self {
        let credential = match (
            non_empty_env("IDENTITY_ENDPOINT"),
            non_empty_env("IDENTITY_HEADER"),
        ) {
            (Some(endpoint), Some(header)) => Self::app_service(client, endpoint, header, timeout),
            _ => Self::imds(client, IMDS_TOKEN_ENDPOINT, timeout),
        };

        credential.with_client_id(non_empty_env("AZURE_CLIENT_ID"))
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    fn name(&self) -> &str {
        match self.endpoint {
            ManagedIdentityEndpoint::AppService { .. } => "managed_identity_app_service",
            ManagedIdentityEndpoint::Imds { .. } => "managed_identity_imds",
        }
    }

    async fn get_token(&self, scope: &str) -> Result<String, SecretError> {
        let resource = scope_to_resource(scope);

        let mut request = match &self.endpoint {
            ManagedIdentityEndpoint::AppService { endpoint, header } => self
                .client
                .get(endpoint)
                .query(&[("api-version", APP_SERVICE_API_VERSION), ("resource", resource)])
                .header("X-IDENTITY-HEADER", header),
            ManagedIdentityEndpoint::Imds { endpoint } => self
                .client
                .get(endpoint)
                .query(&[("api-version", IMDS_API_VERSION), ("resource", resource)])
                .header("Metadata", "true"),
        };

        if let Some(client_id) = &self.client_id {
            request = request.query(&[("client_id", client_id.as_str())]);
        }

        fetch_token(request.timeout(self.timeout), self.name()).await
    }
}

/// Tries each credential in order and returns the first token obtained
pub struct DefaultCredential {
    sources: Vec<Arc<dyn TokenCredential>>,
}

impl DefaultCredential {
    pub fn new(sources: Vec<Arc<dyn TokenCredential>>) -> Self {
        Self { sources }
    }

    /// Service principal from the environment (if configured), then managed identity
    pub fn from_env(client: Client, timeout: Duration) -> Self {
        let mut sources: Vec<Arc<dyn TokenCredential>> = Vec::new();

        if let Some(credential) = ClientSecretCredential::from_env(client.clone(), timeout) {
            sources.push(Arc::new(credential));
        }
        sources.push(Arc::new(ManagedIdentityCredential::from_env(client, timeout)));

        Self::new(sources)
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl TokenCredential for DefaultCredential {
    fn name(&self) -> &str {
        "default"
    }

    async fn get_token(&self, scope: &str) -> Result<String, SecretError> {
        let mut failures = Vec::new();

        for source in &self.sources {
            match source.get_token(scope).await {
                Ok(token) => return Ok(token),
                Err(e) => {
                    tracing::debug!(credential = source.name(), error = %e, "Credential unavailable");
                    failures.push(e.to_string());
                }
            }
        }

        Err(SecretError::Identity(format!(
            "no credential produced a token: [{}]",
            failures.join("; ")
        )))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_string_contains, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    const VAULT_SCOPE: &str = "https://vault.azure.net/.default";

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }

    #[test]
    fn test_scope_to_resource() {
        assert_eq!(scope_to_resource(VAULT_SCOPE), "https://vault.azure.net");
        assert_eq!(scope_to_resource("https://vault.azure.net"), "https://vault.azure.net");
    }

    #[tokio::test]
    async fn test_client_secret_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=app-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "sp-token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = ClientSecretCredential::new(
            Client::new(),
            server.uri(),
            "tenant-1",
            "app-1",
            "shh",
            timeout(),
        );

        assert_eq!(credential.get_token(VAULT_SCOPE).await.unwrap(), "sp-token");
    }

    #[tokio::test]
    async fn test_imds_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata/identity/oauth2/token"))
            .and(query_param("resource", "https://vault.azure.net"))
            .and(query_param("api-version", IMDS_API_VERSION))
            .and(header("Metadata", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "mi-token" })),
            )
            .mount(&server)
            .await;

        let credential = ManagedIdentityCredential::imds(
            Client::new(),
            format!("{}/metadata/identity/oauth2/token", server.uri()),
            timeout(),
        );

        assert_eq!(credential.name(), "managed_identity_imds");
        assert_eq!(credential.get_token(VAULT_SCOPE).await.unwrap(), "mi-token");
    }

    #[tokio::test]
    async fn test_app_service_credential_sends_identity_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/msi/token"))
            .and(header("X-IDENTITY-HEADER", "secret-header"))
            .and(query_param("client_id", "user-assigned"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "app-token" })),
            )
            .mount(&server)
            .await;

        let credential = ManagedIdentityCredential::app_service(
            Client::new(),
            format!("{}/msi/token", server.uri()),
            "secret-header",
            timeout(),
        )
        .with_client_id(Some("user-assigned".to_string()));

        assert_eq!(credential.get_token(VAULT_SCOPE).await.unwrap(), "app-token");
    }

    #[tokio::test]
    async fn test_credential_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("identity not found"))
            .mount(&server)
            .await;

        let credential = ManagedIdentityCredential::imds(Client::new(), server.uri(), timeout());
        let err = credential.get_token(VAULT_SCOPE).await.unwrap_err();

        assert!(matches!(err, SecretError::Identity(_)));
        assert!(err.to_string().contains("identity not found"));
    }

    #[tokio::test]
    async fn test_default_credential_falls_through() {
        let failing = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&failing)
            .await;

        let working = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "second" })),
            )
            .mount(&working)
            .await;

        let credential = DefaultCredential::new(vec![
            Arc::new(ManagedIdentityCredential::imds(Client::new(), failing.uri(), timeout())),
            Arc::new(ManagedIdentityCredential::imds(Client::new(), working.uri(), timeout())),
        ]);

        assert_eq!(credential.get_token(VAULT_SCOPE).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_default_credential_reports_all_failures() {
        let credential = DefaultCredential::new(Vec::new());
        let err = credential.get_token(VAULT_SCOPE).await.unwrap_err();
        assert!(err.to_string().contains("no credential produced a token"));
    }
}
