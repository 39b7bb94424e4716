use chrono::{DateTime, Utc};

use crate::models::purchase::{truncate_history, PriceEntry};

/// Decides how a purchase's price history changes when a price is written.
///
/// Pure: never mutates its inputs and returns a fresh history.
pub struct PriceHistoryService;

impl PriceHistoryService {
    pub fn new() -> Self {
        Self
    }

    /// Compute the history after observing `new_price`.
    ///
    /// - A record with no history but a positive `existing_price` is first
    ///   seeded with that price, dated `last_updated` (or `now`).
    /// - `new_price` is appended, dated `now`, when it is positive and differs
    ///   from the last recorded price (or nothing usable was recorded).
    /// - Prices `<= 0` are "unknown" and never recorded.
    /// - Only the newest `MAX_PRICE_HISTORY` (10) entries are kept; eviction
    ///   follows insertion order, which is assumed chronological.
    pub fn reconcile(
        &self,
        existing: &[PriceEntry],
        new_price: f64,
        existing_price: Option<f64>,
        last_updated: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Vec<PriceEntry> {
        let mut history = existing.to_vec();

        if history.is_empty() {
            if let Some(price) = existing_price.filter(|p| p.is_finite() && *p > 0.0) {
                history.push(PriceEntry::new(last_updated.unwrap_or(now), price));
            }
        }

        let new_price_known = new_price.is_finite() && new_price > 0.0;
        let last_recorded = history
            .last()
            .map(|e| e.price_per_unit)
            .filter(|p| p.is_finite());

        if new_price_known && last_recorded != Some(new_price) {
            history.push(PriceEntry::new(now, new_price));
        }

        if history.is_empty() && new_price_known {
            history.push(PriceEntry::new(now, new_price));
        }

        truncate_history(&mut history);
        history
    }
}

impl Default for PriceHistoryService {
    fn default() -> Self {
        Self::new()
    }
}
