use async_trait::async_trait;

use super::dates::DeliveryDates;
use super::failure::UpstreamFailure;
use crate::domain::postal_code::PostalCode;
use crate::domain::token::ApiToken;

/// Port for the Posten delivery-days upstream
///
/// Implementations own transport details such as headers, timeouts and retries.
#[async_trait]
pub trait PostenGateway: Send + Sync {
    /// Fetch delivery dates for a postal code using the given token
    async fn fetch_dates(
        &self,
        token: &ApiToken,
        code: &PostalCode,
    ) -> Result<DeliveryDates, UpstreamFailure>;

    /// Read a fresh API token out of the public delivery page
    async fn scrape_token(&self) -> Result<ApiToken, UpstreamFailure>;
}
