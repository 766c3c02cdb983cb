//! Day-scoped LRU cache of successful lookups
//!
//! Entries are keyed by `(day, postal code)` and the whole cache is dropped
//! the first time it is touched on a new day.

use chrono::NaiveDate;
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

use crate::domain::delivery::DeliveryDates;
use crate::domain::postal_code::PostalCode;

/// Default number of postal codes kept per day
pub const DEFAULT_CAPACITY: usize = 5096;

pub struct DailyCache {
    entries: LruCache<(NaiveDate, PostalCode), DeliveryDates>,
    current_day: NaiveDate,
}

impl DailyCache {
    pub fn new(capacity: NonZeroUsize, today: NaiveDate) -> Self {
        Self {
            entries: LruCache::new(capacity),
            current_day: today,
        }
    }

    /// Clears the cache when `today` is not the day it was filled on
    fn roll_over(&mut self, today: NaiveDate) {
        if today != self.current_day {
            debug!(
                "Day changed from {} to {}, dropping {} cached entries",
                self.current_day,
                today,
                self.entries.len()
            );
            self.entries.clear();
            self.current_day = today;
        }
    }

    pub fn get(&mut self, today: NaiveDate, code: &PostalCode) -> Option<DeliveryDates> {
        self.roll_over(today);
        self.entries.get(&(today, code.clone())).cloned()
    }

    pub fn put(&mut self, today: NaiveDate, code: PostalCode, dates: DeliveryDates) {
        self.roll_over(today);
        self.entries.put((today, code), dates);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_day(&self) -> NaiveDate {
        self.current_day
    }
}
