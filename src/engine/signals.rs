use chrono::{DateTime, Utc};

use crate::config::{PRICE_DROP_WINDOW_DAYS, RELIST_MISSING_MIN_DAYS};
use crate::error::Result;
use crate::store::sqlite::parse_ts;
use crate::store::ListingStore;
use crate::types::EventType;

/// Derives the temporal deal signals for one listing id from store history.
pub struct SignalCalculator<'a> {
    store: &'a dyn ListingStore,
}

impl<'a> SignalCalculator<'a> {
    pub fn new(store: &'a dyn ListingStore) -> Self {
        Self { store }
    }

    /// Whole days since the listing was first seen, clamped at zero.
    /// None when the id has no stored record.
    pub async fn days_on_market(
        &self,
        listing_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let Some(row) = self.store.get_current(listing_id).await? else {
            return Ok(None);
        };
        let Some(first_seen) = parse_ts(&row.first_seen) else {
            return Ok(None);
        };
        Ok(Some((now - first_seen).num_days().max(0)))
    }

    /// Largest drawdown from any price seen in the trailing 30 days,
    /// as a ratio in [0, 1] rounded to 4 decimals.
    ///
    /// The candidate set is every old/new value of recent `price_change`
    /// events plus the current stored price; malformed historical values
    /// are skipped individually.
    pub async fn price_drop_ratio_30d(
        &self,
        listing_id: &str,
        now: DateTime<Utc>,
    ) -> Result<f64> {
        let Some(row) = self.store.get_current(listing_id).await? else {
            return Ok(0.0);
        };
        let current_price = row.price as f64;

        let events = self
            .store
            .history(listing_id, PRICE_DROP_WINDOW_DAYS, now)
            .await?;

        let mut prices: Vec<f64> = Vec::new();
        for event in &events {
            if event.event_type != EventType::PriceChange.as_str() {
                continue;
            }
            for value in [&event.old_value, &event.new_value] {
                if let Some(p) = value.as_deref().and_then(|v| v.parse::<f64>().ok()) {
                    prices.push(p);
                }
            }
        }
        prices.push(current_price);

        let max_price = prices.iter().cloned().fold(f64::MIN, f64::max);
        if max_price <= 0.0 {
            return Ok(0.0);
        }
        let drop = ((max_price - current_price) / max_price).max(0.0);
        Ok((drop * 10_000.0).round() / 10_000.0)
    }

    /// True when the listing looks like a relist of something seen before:
    /// (a) its own most recent `missing` event is at least 7 days old, or
    /// (b) another id with the same signature is currently inactive.
    ///
    /// Clause (b) deliberately triggers regardless of how recently the other
    /// id went inactive — only a strictly active sibling disqualifies the
    /// match. The asymmetry with clause (a)'s 7-day floor is intentional and
    /// pinned by `inactive_sibling_triggers_regardless_of_recency`.
    pub async fn detect_relist(&self, listing_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let Some(row) = self.store.get_current(listing_id).await? else {
            return Ok(false);
        };
        if row.signature.is_empty() {
            return Ok(false);
        }

        if let Some(missing_at) = self.store.latest_missing_at(listing_id).await? {
            if (now - missing_at).num_days() >= RELIST_MISSING_MIN_DAYS {
                return Ok(true);
            }
        }

        if let Some((_, other_active, _other_last_seen)) = self
            .store
            .latest_other_by_signature(&row.signature, listing_id)
            .await?
        {
            if !other_active {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
