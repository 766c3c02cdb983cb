// API tokens accepted by the delivery-days endpoint
// Generated tokens are derived from a fixed seed and the wall clock

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base64 seed prepended (decoded) to the timestamp
pub const TOKEN_SEED_B64: &str = "pils";

/// Where a token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// Computed locally from the seed and current time
    #[serde(rename = "generated_token")]
    Generated,
    /// Read out of the public delivery page
    #[serde(rename = "scraped_token")]
    Scraped,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Generated => write!(f, "generated_token"),
            TokenKind::Scraped => write!(f, "scraped_token"),
        }
    }
}

/// Token value paired with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiToken {
    value: String,
    kind: TokenKind,
}

impl ApiToken {
    /// Generates a token for the given unix timestamp
    ///
    /// `base64(base64decode(seed) ++ ascii(unix_seconds))` with padding removed.
    pub fn generate(unix_seconds: i64) -> Self {
        let mut raw = STANDARD.decode(TOKEN_SEED_B64).unwrap_or_default();
        raw.extend_from_slice(unix_seconds.to_string().as_bytes());

        Self {
            value: STANDARD_NO_PAD.encode(raw),
            kind: TokenKind::Generated,
        }
    }

    /// Generates a token for the current time
    pub fn generate_now() -> Self {
        Self::generate(chrono::Utc::now().timestamp())
    }

    /// Wraps a token scraped from the delivery page
    pub fn scraped(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TokenKind::Scraped,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }
}
