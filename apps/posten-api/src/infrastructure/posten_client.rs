use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use super::token_scraper::{extract_api_key, ScrapeError};
use super::upstream_status::UpstreamStatus;
use crate::domain::delivery::{DeliveryDates, PostenGateway, Stage, UpstreamFailure};
use crate::domain::postal_code::PostalCode;
use crate::domain::token::ApiToken;

/// Public site, used for `Origin` and as the base of every upstream URL
pub const POSTEN_ORIGIN: &str = "https://www.posten.no";
/// Delivery page, relative to the origin
pub const DELIVERY_PAGE_PATH: &str = "/levering-av-post";
/// Delivery-days service, relative to the delivery page
pub const SERVICE_PATH: &str = "/_/service/no.posten.website/delivery-days";
/// Header carrying the API token
pub const TOKEN_HEADER: &str = "kp-api-token";

/// Connection and request timeouts for upstream calls
#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(3050),
            request: Duration::from_secs(8),
        }
    }
}

/// reqwest-backed gateway to posten.no
#[derive(Debug, Clone)]
pub struct PostenClient {
    http: Client,
    page_url: String,
    service_url: String,
    retry: RetryPolicy,
    status: UpstreamStatus,
}

impl PostenClient {
    /// Builds a client against `base_url` (normally [`POSTEN_ORIGIN`])
    ///
    /// # Returns
    /// * `Ok(PostenClient)` - Ready to use
    /// * `Err(reqwest::Error)` - If the HTTP client cannot be built
    pub fn new(
        base_url: &str,
        timeouts: Timeouts,
        retry: RetryPolicy,
        status: UpstreamStatus,
    ) -> Result<Self, reqwest::Error> {
        let base = base_url.trim_end_matches('/');
        let page_url = format!("{}{}", base, DELIVERY_PAGE_PATH);
        let service_url = format!("{}{}", page_url, SERVICE_PATH);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, */*;q=0.1"),
        );
        if let Ok(origin) = HeaderValue::from_str(base) {
            headers.insert(ORIGIN, origin);
        }
        if let Ok(referer) = HeaderValue::from_str(&page_url) {
            headers.insert(REFERER, referer);
        }

        let http = Client::builder()
            .default_headers(headers)
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            http,
            page_url,
            service_url,
            retry,
            status,
        })
    }

    /// GET with the retry policy applied
    ///
    /// Once retries run out on a retryable status the last response is
    /// returned as-is, so callers see the real upstream status.
    async fn get_with_retry(
        &self,
        url: &str,
        token: Option<&ApiToken>,
    ) -> Result<Response, reqwest::Error> {
        let mut retry = 0;
        loop {
            let mut request = self.http.get(url);
            if let Some(token) = token {
                request = request.header(TOKEN_HEADER, token.as_str());
            }

            let exhausted = retry >= self.retry.max_retries;
            let delay = match request.send().await {
                Ok(response) if exhausted || !self.retry.should_retry_status(response.status()) => {
                    return Ok(response)
                }
                Ok(response) => {
                    warn!("Upstream {} returned {}, retrying", url, response.status());
                    RetryPolicy::retry_after(response.headers())
                }
                Err(e) if !exhausted && self.retry.should_retry_error(&e) => {
                    warn!("Upstream {} failed: {}, retrying", url, e);
                    None
                }
                Err(e) => return Err(e),
            };

            retry += 1;
            let delay = delay.unwrap_or_else(|| self.retry.backoff(retry));
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[async_trait]
impl PostenGateway for PostenClient {
    async fn fetch_dates(
        &self,
        token: &ApiToken,
        code: &PostalCode,
    ) -> Result<DeliveryDates, UpstreamFailure> {
        let url = format!("{}?postalCode={}", self.service_url, code);
        debug!("Fetching delivery dates for {} with {}", code, token.kind());

        let response = self
            .get_with_retry(&url, Some(token))
            .await
            .map_err(|e| UpstreamFailure::transport(Stage::FetchDates, e.to_string()))?;

        let status = response.status();
        self.status.record(status.as_u16(), token.kind());

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamFailure::transport(Stage::FetchDates, e.to_string()))?;

        if status != StatusCode::OK {
            return Err(UpstreamFailure::non_ok(status.as_u16(), body));
        }

        let payload: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| UpstreamFailure::invalid_json(&body))?;

        DeliveryDates::from_payload(payload)
            .map_err(|invalid| UpstreamFailure::invalid_payload(invalid.message, invalid.body))
    }

    async fn scrape_token(&self) -> Result<ApiToken, UpstreamFailure> {
        debug!("Scraping API token from {}", self.page_url);

        self.delivery_page()
            .await
            .and_then(|html| extract_api_key(&html))
            .map(ApiToken::scraped)
            .map_err(|e| UpstreamFailure::scrape(e.to_string()))
    }
}

impl PostenClient {
    /// HTML of the public delivery page
    async fn delivery_page(&self) -> Result<String, ScrapeError> {
        let response = self
            .get_with_retry(&self.page_url, None)
            .await
            .map_err(|e| ScrapeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::TokenKind;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer, retry: RetryPolicy, status: UpstreamStatus) -> PostenClient {
        PostenClient::new(&server.base_url(), Timeouts::default(), retry, status).unwrap()
    }

    fn client_with_timeouts(
        server: &MockServer,
        timeouts: Timeouts,
        retry: RetryPolicy,
    ) -> PostenClient {
        PostenClient::new(&server.base_url(), timeouts, retry, UpstreamStatus::new()).unwrap()
    }

    fn code() -> PostalCode {
        PostalCode::from_segment("4321").unwrap()
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            backoff_factor: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn fetch_sends_token_and_browser_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/levering-av-post/_/service/no.posten.website/delivery-days")
                    .query_param("postalCode", "4321")
                    .header("kp-api-token", "scraped-key")
                    .header("user-agent", "Mozilla/5.0")
                    .header("referer", format!("{}/levering-av-post", server.base_url()));
                then.status(200)
                    .json_body(json!({ "delivery_dates": ["2024-03-05"] }));
            })
            .await;

        let status = UpstreamStatus::new();
        let client = client(&server, RetryPolicy::none(), status.clone());
        let dates = client
            .fetch_dates(&ApiToken::scraped("scraped-key"), &code())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(dates.dates().len(), 1);
        assert_eq!(status.snapshot().status, Some(200));
        assert_eq!(status.snapshot().note, Some(TokenKind::Scraped));
    }

    #[tokio::test]
    async fn non_ok_status_is_reported_with_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("delivery-days");
                then.status(401).body("bad token");
            })
            .await;

        let status = UpstreamStatus::new();
        let client = client(&server, RetryPolicy::none(), status.clone());
        let failure = client
            .fetch_dates(&ApiToken::generate_now(), &code())
            .await
            .unwrap_err();

        assert_eq!(failure.status, Some(401));
        assert_eq!(failure.response_status, 401);
        assert_eq!(failure.body, Some(json!("bad token")));
        assert_eq!(status.snapshot().note, Some(TokenKind::Generated));
    }

    #[tokio::test]
    async fn invalid_json_is_bad_gateway() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("delivery-days");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let client = client(&server, RetryPolicy::none(), UpstreamStatus::new());
        let failure = client
            .fetch_dates(&ApiToken::generate_now(), &code())
            .await
            .unwrap_err();

        assert_eq!(failure.error, "invalid JSON");
        assert_eq!(failure.response_status, 502);
    }

    #[tokio::test]
    async fn empty_object_is_missing_dates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("delivery-days");
                then.status(200).json_body(json!({}));
            })
            .await;

        let client = client(&server, RetryPolicy::none(), UpstreamStatus::new());
        let failure = client
            .fetch_dates(&ApiToken::generate_now(), &code())
            .await
            .unwrap_err();

        assert_eq!(failure.error, "missing 'delivery_dates'");
        assert_eq!(failure.body, Some(json!({})));
    }

    #[tokio::test]
    async fn retries_until_exhausted_then_returns_last_status() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path_contains("delivery-days");
                then.status(503).body("busy");
            })
            .await;

        let client = client(&server, fast_retry(), UpstreamStatus::new());
        let failure = client
            .fetch_dates(&ApiToken::generate_now(), &code())
            .await
            .unwrap_err();

        mock.assert_hits_async(4).await;
        assert_eq!(failure.status, Some(503));
        assert_eq!(failure.response_status, 503);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path_contains("delivery-days");
                then.status(404);
            })
            .await;

        let client = client(&server, fast_retry(), UpstreamStatus::new());
        let _ = client.fetch_dates(&ApiToken::generate_now(), &code()).await;

        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn connection_refused_is_transport_failure() {
        let client = PostenClient::new(
            "http://127.0.0.1:1",
            Timeouts::default(),
            RetryPolicy::none(),
            UpstreamStatus::new(),
        )
        .unwrap();

        let failure = client
            .fetch_dates(&ApiToken::generate_now(), &code())
            .await
            .unwrap_err();

        assert_eq!(failure.status, None);
        assert_eq!(failure.stage, Stage::FetchDates);
        assert_eq!(failure.response_status, 502);
    }

    #[tokio::test]
    async fn scrape_reads_api_key_from_page() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/levering-av-post");
                then.status(200).body(
                    r#"<html><body><script data-react4xp-ref="parts_mailbox-delivery__main_1_leftRegion_11">{"props":{"apiKey":"page-key"}}</script></body></html>"#,
                );
            })
            .await;

        let client = client(&server, RetryPolicy::none(), UpstreamStatus::new());
        let token = client.scrape_token().await.unwrap();

        assert_eq!(token.as_str(), "page-key");
        assert_eq!(token.kind(), TokenKind::Scraped);
    }

    #[tokio::test]
    async fn scrape_of_error_page_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/levering-av-post");
                then.status(500);
            })
            .await;

        let client = client(&server, RetryPolicy::none(), UpstreamStatus::new());
        let failure = client.scrape_token().await.unwrap_err();

        assert_eq!(failure.stage, Stage::ScrapeToken);
        assert_eq!(failure.response_status, 502);
        assert_eq!(failure.error, "delivery page returned status 500");
    }

    #[tokio::test]
    async fn scrape_of_unreachable_page_is_transport_error() {
        let client = PostenClient::new(
            "http://127.0.0.1:1",
            Timeouts::default(),
            RetryPolicy::none(),
            UpstreamStatus::new(),
        )
        .unwrap();

        let failure = client.scrape_token().await.unwrap_err();

        assert_eq!(failure.stage, Stage::ScrapeToken);
        assert!(
            failure.error.starts_with("delivery page request failed"),
            "{}",
            failure.error
        );
    }

    #[tokio::test]
    async fn timeouts_are_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path_contains("delivery-days");
                then.status(200)
                    .delay(Duration::from_millis(300))
                    .json_body(json!({ "delivery_dates": [] }));
            })
            .await;

        let timeouts = Timeouts {
            connect: Duration::from_secs(1),
            request: Duration::from_millis(50),
        };
        let client = client_with_timeouts(&server, timeouts, fast_retry());
        let failure = client
            .fetch_dates(&ApiToken::generate_now(), &code())
            .await
            .unwrap_err();

        mock.assert_hits_async(4).await;
        assert_eq!(failure.status, None);
        assert_eq!(failure.response_status, 502);
    }

    #[tokio::test]
    async fn retry_after_header_delays_next_attempt() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path_contains("delivery-days");
                then.status(429).header("retry-after", "1");
            })
            .await;

        let retry = RetryPolicy {
            max_retries: 1,
            backoff_factor: Duration::ZERO,
        };
        let client = client(&server, retry, UpstreamStatus::new());

        let started = std::time::Instant::now();
        let failure = client
            .fetch_dates(&ApiToken::generate_now(), &code())
            .await
            .unwrap_err();

        assert!(started.elapsed() >= Duration::from_secs(1));
        mock.assert_hits_async(2).await;
        assert_eq!(failure.status, Some(429));
    }
}
