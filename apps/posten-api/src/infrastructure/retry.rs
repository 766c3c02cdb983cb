use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;

/// Statuses worth another attempt
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Retry policy for idempotent upstream GETs
///
/// # Backoff
/// No sleep before the first retry, then `backoff_factor * 2^(n-1)` before
/// retry `n`. A `Retry-After` header in seconds on a retryable response
/// takes precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_factor: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        self.backoff_factor * 2u32.saturating_pow(retry - 1)
    }

    pub fn should_retry_status(&self, status: StatusCode) -> bool {
        RETRY_STATUSES.contains(&status.as_u16())
    }

    /// Transport errors that are safe to retry for a GET
    pub fn should_retry_error(&self, error: &reqwest::Error) -> bool {
        error.is_connect() || error.is_timeout()
    }

    /// `Retry-After` in whole seconds, if present and parseable
    pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
        headers
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn default_matches_upstream_tuning() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff_factor, Duration::from_millis(500));
    }

    #[test]
    fn first_retry_does_not_sleep() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.backoff(2), Duration::from_secs(1));
        assert_eq!(policy.backoff(3), Duration::from_secs(2));
    }

    #[test]
    fn retryable_statuses() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(policy.should_retry_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!policy.should_retry_status(StatusCode::NOT_FOUND));
        assert!(!policy.should_retry_status(StatusCode::OK));
        assert!(!policy.should_retry_status(StatusCode::NOT_IMPLEMENTED));
    }

    #[test]
    fn retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(RetryPolicy::retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(RetryPolicy::retry_after(&headers), Some(Duration::from_secs(2)));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(RetryPolicy::retry_after(&headers), None);
    }
}
