use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::middleware::UrlRoot;
use crate::api::state::AppState;
use crate::infrastructure::upstream_status::{now_local, LastUpstream};

/// File served as the favicon, relative to the static directory
pub const FAVICON_FILE: &str = "posten-logo-ud.png";

const SOURCE_URL: &str = "https://github.com/Lanjelin/docker-posten/";

/// Response from the health endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub last_upstream: LastUpstream,
    pub time: String,
}

/// Usage page linking the three views
///
/// GET /
pub async fn index(UrlRoot(root): UrlRoot) -> Html<String> {
    let root = escape_html(&root);
    let link = |view: &str| {
        let url = format!("{}{}/4321.json", root, view);
        format!("<a href='{0}'>{0}</a>", url)
    };

    Html(format!(
        "Usage: <br>\
         &emsp; {} for raw data.<br>\
         &emsp; {} for formatted text dates.<br>\
         &emsp; {} for days until next delivery.<br>\
         <br><br>Source on <a href='{}'>GitHub</a>",
        link("raw"),
        link("text"),
        link("next"),
        SOURCE_URL
    ))
}

/// Escapes text for use inside an HTML attribute or element
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Health check with a hint about the last upstream call
///
/// GET /healthz
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        last_upstream: state.upstream_status.snapshot(),
        time: now_local(),
    })
}

/// Favicon from the static directory
///
/// GET /favicon.ico
pub async fn favicon(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let path = state.static_dir.join(FAVICON_FILE);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        tracing::debug!("Favicon {} unavailable: {}", path.display(), e);
        ApiError::not_found("favicon not found")
    })?;

    Ok(([(CONTENT_TYPE, "image/vnd.microsoft.icon")], bytes))
}
