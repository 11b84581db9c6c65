use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::store::ListingStore;
use crate::types::{EventType, ListingSnapshot, UpsertOutcome};

/// Converts one run's batch of observed snapshots into store mutations.
///
/// The set of active ids is captured once, before any snapshot is
/// processed; after the batch, every previously active id that was not
/// re-observed is flipped inactive exactly once. An id that stays absent on
/// later runs is already inactive and never reconsidered, so a listing
/// accumulates one `missing` event per disappearance, not per run.
pub struct LifecycleTracker {
    previously_active: HashSet<String>,
    observed: HashSet<String>,
}

impl LifecycleTracker {
    pub async fn begin(store: &dyn ListingStore) -> Result<Self> {
        let previously_active = store.current_active_ids().await?;
        Ok(Self {
            previously_active,
            observed: HashSet::new(),
        })
    }

    /// Records one observed snapshot: upsert, price-change event when the
    /// stored price differs, presence mark.
    pub async fn observe(
        &mut self,
        store: &dyn ListingStore,
        snapshot: &ListingSnapshot,
        signature: &str,
        desc_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        let outcome = store
            .upsert_current(snapshot, signature, desc_hash, now)
            .await?;

        if outcome.price_changed {
            store
                .append_event(
                    &snapshot.listing_id,
                    EventType::PriceChange,
                    outcome.old_price.map(|p| p.to_string()),
                    Some(snapshot.price.to_string()),
                    now,
                )
                .await?;
        }

        store.mark_present(&snapshot.listing_id, now).await?;
        self.observed.insert(snapshot.listing_id.clone());
        Ok(outcome)
    }

    /// Marks every previously active id absent from this run's batch as
    /// inactive. Returns the ids that transitioned.
    pub async fn reconcile(
        self,
        store: &dyn ListingStore,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>> {
        let mut missing: Vec<String> = self
            .previously_active
            .difference(&self.observed)
            .cloned()
            .collect();
        missing.sort();

        for listing_id in &missing {
            debug!(listing_id = %listing_id, "listing disappeared from batch, marking inactive");
            store.mark_inactive(listing_id, now).await?;
        }
        Ok(missing)
    }
}
