use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Status used when the upstream failure has no usable HTTP status of its own
pub const BAD_GATEWAY: u16 = 502;

/// Upstream bodies attached to invalid-JSON failures are cut to this many characters
pub const BODY_EXCERPT_CHARS: usize = 500;

/// Step of the lookup that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ScrapeToken,
    FetchDates,
}

/// Which fallback attempt failed, reported once the generated token is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureOrigin {
    TokenScrape,
    FetchWithScrapedToken,
}

/// Failure talking to the Posten upstream
///
/// Serialises to the payload returned under `upstream` in error responses.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{stage:?} failed: {error}")]
pub struct UpstreamFailure {
    #[serde(rename = "source", skip_serializing_if = "Option::is_none")]
    pub origin: Option<FailureOrigin>,
    #[serde(rename = "where")]
    pub stage: Stage,
    pub status: Option<u16>,
    pub body: Option<Value>,
    pub error: String,
    /// Status the API answers with
    #[serde(skip)]
    pub response_status: u16,
}

impl UpstreamFailure {
    /// Request never produced a response
    pub fn transport(stage: Stage, error: impl Into<String>) -> Self {
        Self {
            origin: None,
            stage,
            status: None,
            body: None,
            error: error.into(),
            response_status: BAD_GATEWAY,
        }
    }

    /// Upstream answered with something other than 200
    ///
    /// Client and server errors are passed through, anything else becomes 502.
    pub fn non_ok(status: u16, body: String) -> Self {
        let response_status = if (400..600).contains(&status) {
            status
        } else {
            BAD_GATEWAY
        };

        Self {
            origin: None,
            stage: Stage::FetchDates,
            status: Some(status),
            body: Some(Value::String(body)),
            error: "upstream non-200".to_string(),
            response_status,
        }
    }

    /// 200 with a body that is not JSON
    pub fn invalid_json(body: &str) -> Self {
        let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        Self {
            origin: None,
            stage: Stage::FetchDates,
            status: Some(200),
            body: Some(Value::String(excerpt)),
            error: "invalid JSON".to_string(),
            response_status: BAD_GATEWAY,
        }
    }

    /// 200 with JSON that lacks usable delivery dates
    pub fn invalid_payload(error: impl Into<String>, body: Value) -> Self {
        Self {
            origin: None,
            stage: Stage::FetchDates,
            status: Some(200),
            body: Some(body),
            error: error.into(),
            response_status: BAD_GATEWAY,
        }
    }

    /// Token could not be scraped from the delivery page
    pub fn scrape(error: impl Into<String>) -> Self {
        Self::transport(Stage::ScrapeToken, error)
    }

    /// Tags the failure with the fallback attempt it came from
    pub fn with_origin(mut self, origin: FailureOrigin) -> Self {
        self.origin = Some(origin);
        self
    }
}
