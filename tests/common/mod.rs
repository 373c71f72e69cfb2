//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use portfolio_assistant::{
    config::RelayConfig,
    handlers::{index::load_templates, AppState},
    secrets::{SecretError, SecretResolver, SecretStore, TokenCredential},
    server::create_router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Credential that always hands out the same token
pub struct StaticToken(pub &'static str);

#[async_trait]
impl TokenCredential for StaticToken {
    fn name(&self) -> &str {
        "static_token"
    }

    async fn get_token(&self, _scope: &str) -> Result<String, SecretError> {
        Ok(self.0.to_string())
    }
}

/// Credential that can never authenticate
pub struct NoCredential;

#[async_trait]
impl TokenCredential for NoCredential {
    fn name(&self) -> &str {
        "none"
    }

    async fn get_token(&self, _scope: &str) -> Result<String, SecretError> {
        Err(SecretError::Identity("no identity available".to_string()))
    }
}

/// Canned successful completion body
pub fn completion_body(content: &str) -> Value {
    serde_json::json!({
        "id": "chatcmpl-test123",
        "object": "chat.completion",
        "created": 1234567890,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 9, "completion_tokens": 2, "total_tokens": 11 }
    })
}

pub fn test_app(store: Arc<dyn SecretStore>, relay: RelayConfig) -> Router {
    let state = AppState {
        relay: Arc::new(relay),
        service_name: Arc::from("Test Assistant"),
        http_client: reqwest::Client::new(),
        secrets: SecretResolver::new(store),
        templates: Arc::new(load_templates().expect("templates compile")),
    };

    create_router(state, None)
}

/// POST a raw body to `/ask` and decode the JSON answer
pub async fn post_ask(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
