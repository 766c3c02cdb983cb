use chrono::NaiveDate;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

use super::dates::DeliveryDates;
use super::failure::{FailureOrigin, UpstreamFailure};
use super::gateway::PostenGateway;
use crate::domain::postal_code::PostalCode;
use crate::domain::token::ApiToken;
use crate::infrastructure::daily_cache::DailyCache;

/// Looks up delivery dates with token fallback and a day-scoped cache
///
/// # Lookup order
/// 1. Cached result for today
/// 2. Upstream with a locally generated token
/// 3. Upstream with a token scraped from the delivery page
///
/// Only successful lookups are cached.
pub struct DeliveryService {
    gateway: Arc<dyn PostenGateway>,
    cache: Mutex<DailyCache>,
}

impl DeliveryService {
    pub fn new(gateway: Arc<dyn PostenGateway>, capacity: NonZeroUsize, today: NaiveDate) -> Self {
        Self {
            gateway,
            cache: Mutex::new(DailyCache::new(capacity, today)),
        }
    }

    /// Delivery dates for `code` as seen on `today`
    pub async fn lookup(
        &self,
        code: &PostalCode,
        today: NaiveDate,
    ) -> Result<DeliveryDates, UpstreamFailure> {
        info!("Delivery lookup for {}", code);

        if let Some(hit) = self.cached(today, code) {
            return Ok(hit);
        }

        let generated = ApiToken::generate_now();
        let first = match self.gateway.fetch_dates(&generated, code).await {
            Ok(dates) => {
                self.remember(today, code, &dates);
                return Ok(dates);
            }
            Err(e) => e,
        };

        warn!(
            "Generated token failed for {}: status={:?} err={}",
            code, first.status, first.error
        );

        let scraped = match self.gateway.scrape_token().await {
            Ok(token) => token,
            Err(e) => {
                let failure = e.with_origin(FailureOrigin::TokenScrape);
                error!("Token scrape failed for {}: {}", code, failure.error);
                return Err(failure);
            }
        };

        match self.gateway.fetch_dates(&scraped, code).await {
            Ok(dates) => {
                self.remember(today, code, &dates);
                Ok(dates)
            }
            Err(e) => {
                let failure = e.with_origin(FailureOrigin::FetchWithScrapedToken);
                error!(
                    "Scraped token fetch failed for {}: status={:?} err={}",
                    code, failure.status, failure.error
                );
                Err(failure)
            }
        }
    }

    fn cached(&self, today: NaiveDate, code: &PostalCode) -> Option<DeliveryDates> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(today, code)
    }

    fn remember(&self, today: NaiveDate, code: &PostalCode, dates: &DeliveryDates) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(today, code.clone(), dates.clone());
    }
}
