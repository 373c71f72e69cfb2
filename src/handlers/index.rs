use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tera::{Context, Tera};

use super::AppState;

const INDEX_TEMPLATE: &str = "index.html";

/// Compile the page templates bundled into the binary
pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(INDEX_TEMPLATE, include_str!("../../templates/index.html"))?;
    Ok(tera)
}

/// Serve the chat page
pub async fn index(State(state): State<AppState>) -> Response {
    let mut context = Context::new();
    context.insert("service_name", state.service_name.as_ref());

    match state.templates.render(INDEX_TEMPLATE, &context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Template error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}
