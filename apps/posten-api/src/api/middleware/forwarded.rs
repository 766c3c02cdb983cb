use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::HOST, request::Parts, HeaderMap},
};
use std::convert::Infallible;

/// Root used when the request carries no host information
pub const DEFAULT_URL_ROOT: &str = "http://localhost:5000/";

/// Public root URL of the service as seen by the client, with a trailing slash
///
/// Honours one hop of `X-Forwarded-Proto` and `X-Forwarded-Host` so links stay
/// correct behind a reverse proxy.
///
/// Usage:
/// ```rust,ignore
/// async fn handler(UrlRoot(root): UrlRoot) -> String {
///     format!("{}raw/4321.json", root)
/// }
/// ```
pub struct UrlRoot(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UrlRoot
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(UrlRoot(url_root(&parts.headers)))
    }
}

/// Last value of a possibly comma-separated forwarded header
fn forwarded(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.rsplit(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn url_root(headers: &HeaderMap) -> String {
    let host = forwarded(headers, "x-forwarded-host").or_else(|| {
        headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    });

    match host {
        Some(host) => {
            let scheme = forwarded(headers, "x-forwarded-proto").unwrap_or_else(|| "http".into());
            format!("{}://{}/", scheme, host)
        }
        None => DEFAULT_URL_ROOT.to_string(),
    }
}
