//! Extracts the API key embedded in the public delivery page
//!
//! The page renders a React component whose props, including `apiKey`, are
//! serialised as JSON inside a `<script data-react4xp-ref="...">` element.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// `data-react4xp-ref` of the script holding the delivery component props
pub const DELIVERY_SCRIPT_REF: &str = "parts_mailbox-delivery__main_1_leftRegion_11";

#[derive(Debug, Error, PartialEq)]
pub enum ScrapeError {
    #[error("delivery page request failed: {0}")]
    Transport(String),

    #[error("delivery page returned status {0}")]
    Status(u16),

    #[error("delivery script not found")]
    ScriptNotFound,

    #[error("parse failed: {0}")]
    Parse(String),
}

fn script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(
            r#"(?is)<script\b[^>]*\bdata-react4xp-ref\s*=\s*["']{}["'][^>]*>(.*?)</script\s*>"#,
            regex::escape(DELIVERY_SCRIPT_REF)
        );
        Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid script pattern: {}", e))
    })
}

/// Finds the delivery script in `html` and returns `props.apiKey`
pub fn extract_api_key(html: &str) -> Result<String, ScrapeError> {
    let contents = script_pattern()
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or(ScrapeError::ScriptNotFound)?
        .as_str();

    let props: Value =
        serde_json::from_str(contents.trim()).map_err(|e| ScrapeError::Parse(e.to_string()))?;

    props
        .get("props")
        .and_then(|p| p.get("apiKey"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::Parse("'props.apiKey' missing".to_string()))
}
