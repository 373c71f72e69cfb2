use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Errors surfaced by the `/ask` relay
#[derive(Debug)]
pub enum AppError {
    /// Missing, empty or unparseable chat message
    InvalidInput(String),
    /// No credential could be found for the selected provider
    MissingCredential(String),
    /// Transport-level failure reaching the completion endpoint
    UpstreamUnavailable(String),
    /// Completion endpoint answered with a non-success status. The body stays in the logs.
    UpstreamError { status: StatusCode },
    /// Completion endpoint answered 2xx but the body had no reply text
    MalformedResponse(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "{}", msg),
            Self::MissingCredential(msg) => write!(f, "Missing credential: {}", msg),
            Self::UpstreamUnavailable(msg) => write!(f, "Upstream unavailable: {}", msg),
            Self::UpstreamError { status } => write!(f, "Upstream error ({})", status),
            Self::MalformedResponse(msg) => write!(f, "Malformed upstream response: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status returned to the client. Only input errors are the caller's fault.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label used for logs and the error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::MissingCredential(_) => "missing_credential",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::UpstreamError { .. } => "upstream_error",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(format!("JSON error: {}", err))
    }
}
