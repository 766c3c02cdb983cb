// Best-effort record of the last upstream response, surfaced by /healthz

use serde::Serialize;
use std::sync::{Arc, RwLock};

use crate::domain::token::TokenKind;

/// Local timestamp format used by the health endpoint
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Snapshot of the last upstream call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LastUpstream {
    pub status: Option<u16>,
    pub when: Option<String>,
    pub note: Option<TokenKind>,
}

/// Shared tracker, cloned into the client and the app state
#[derive(Debug, Clone, Default)]
pub struct UpstreamStatus {
    inner: Arc<RwLock<LastUpstream>>,
}

impl UpstreamStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, status: u16, kind: TokenKind) {
        let mut last = self.inner.write().unwrap_or_else(|e| e.into_inner());
        last.status = Some(status);
        last.when = Some(now_local());
        last.note = Some(kind);
    }

    pub fn snapshot(&self) -> LastUpstream {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Current local time in health-endpoint format
pub fn now_local() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
