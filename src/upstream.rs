use crate::{error::AppError, models::ChatCompletionResponse, provider::UpstreamRequest};
use reqwest::Client;
use std::time::Duration;

/// Send a completion request and return the parsed body.
///
/// Exactly one attempt is made. Non-2xx statuses become
/// [`AppError::UpstreamError`]; the upstream body is logged but only the
/// status is carried in the error.
pub async fn chat_completions(
    client: &Client,
    request: &UpstreamRequest,
    timeout: Duration,
) -> Result<ChatCompletionResponse, AppError> {
    let (header_name, header_value) = &request.auth_header;

    let response = client
        .post(&request.url)
        .header(*header_name, header_value)
        .header("Content-Type", "application/json")
        .timeout(timeout)
        .json(&request.body)
        .send()
        .await
        .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?;

    // Check for HTTP errors
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!(status = %status, body = %error_text, "Upstream returned error status");
        return Err(AppError::UpstreamError { status });
    }

    let bytes = response.bytes().await?;
    let body: ChatCompletionResponse = serde_json::from_slice(&bytes)?;

    Ok(body)
}

/// Reply text at `choices[0].message.content`
pub fn extract_reply(body: &ChatCompletionResponse) -> Result<String, AppError> {
    body.first_content()
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}
