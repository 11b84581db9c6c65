use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::Settings;
use crate::engine::scorer::{keyword_hits, score_listing, ScoreInput};
use crate::engine::{LifecycleTracker, SignalCalculator};
use crate::error::Result;
use crate::signature::{description_hash, signature_for};
use crate::store::ListingStore;
use crate::types::{EnrichedListing, ListingSnapshot};

/// Drives one run: per observed snapshot, upsert → detect changes → track
/// presence → compute signals → score → emit an enriched record; afterwards
/// reconciles listings that disappeared from the batch.
///
/// Listings are processed sequentially in batch order. Relist detection for
/// one id can depend on another id's just-written state, so processing must
/// not be parallelized across listings sharing a signature.
pub struct EnrichmentPipeline<'a> {
    store: &'a dyn ListingStore,
    settings: &'a Settings,
}

impl<'a> EnrichmentPipeline<'a> {
    pub fn new(store: &'a dyn ListingStore, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    pub async fn run(
        &self,
        batch: &[ListingSnapshot],
        now: DateTime<Utc>,
    ) -> Result<Vec<EnrichedListing>> {
        let mut tracker = LifecycleTracker::begin(self.store).await?;
        let calculator = SignalCalculator::new(self.store);
        let mut enriched = Vec::with_capacity(batch.len());

        for snapshot in batch {
            let signature = signature_for(snapshot);
            let desc_hash = description_hash(&snapshot.description);
            tracker
                .observe(self.store, snapshot, &signature, &desc_hash, now)
                .await?;

            // A just-upserted id always has a record; treat the impossible
            // miss as day zero rather than aborting the batch.
            let dom_days = calculator
                .days_on_market(&snapshot.listing_id, now)
                .await?
                .unwrap_or(0);
            let price_drop_ratio = calculator
                .price_drop_ratio_30d(&snapshot.listing_id, now)
                .await?;
            let is_relist = calculator.detect_relist(&snapshot.listing_id, now).await?;
            let hits = keyword_hits(&snapshot.description, &self.settings.signals);

            let breakdown = score_listing(
                &ScoreInput {
                    price: snapshot.price,
                    assessed_value: snapshot.assessed_value,
                    dom_days: Some(dom_days),
                    price_drop_ratio,
                    is_relist,
                    keyword_hits: hits,
                },
                &self.settings.signals,
            );

            enriched.push(EnrichedListing {
                snapshot: snapshot.clone(),
                signature,
                dom_days,
                price_drop_30d_ratio: price_drop_ratio,
                is_relist,
                score: breakdown.score,
                reasons: breakdown.reasons,
                flags: breakdown.flags,
            });
        }

        let missing = tracker.reconcile(self.store, now).await?;
        info!(
            observed = batch.len(),
            went_missing = missing.len(),
            "enrichment run complete"
        );
        Ok(enriched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, day, 12, 0, 0).unwrap()
    }

    fn snapshot(id: &str, price: i64, description: &str) -> ListingSnapshot {
        ListingSnapshot {
            listing_id: id.to_string(),
            source: "test".to_string(),
            url: format!("https://example.com/{id}"),
            title: "2 bd condo".to_string(),
            address: format!("{id} Example St"),
            city: "Vancouver".to_string(),
            price,
            beds: Some(2.0),
            baths: Some(1.0),
            sqft: Some(800),
            description: description.to_string(),
            assessed_value: Some(1_000_000),
        }
    }

    async fn open_store() -> SqliteStore {
        let store = SqliteStore::connect_in_memory().await.unwrap();
        store.initialize().await.unwrap();
        store
    }

    #[tokio::test]
    async fn rerun_of_unchanged_batch_only_moves_last_seen_and_dom() {
        let store = open_store().await;
        let settings = Settings::default();
        let pipeline = EnrichmentPipeline::new(&store, &settings);
        let batch = vec![snapshot("a", 950_000, "Bright layout.")];

        let first = pipeline.run(&batch, at(1)).await.unwrap();
        let second = pipeline.run(&batch, at(3)).await.unwrap();

        assert_eq!(first[0].dom_days, 0);
        assert_eq!(second[0].dom_days, 2);
        // dom below threshold both times, so the score is unchanged
        assert_eq!(first[0].score, second[0].score);

        let events = store.history("a", 90, at(4)).await.unwrap();
        assert!(events.iter().all(|e| e.event_type != "price_change"));

        let row = store.get_current("a").await.unwrap().unwrap();
        assert_eq!(row.first_seen, crate::store::sqlite::to_ts(at(1)));
        assert_eq!(row.last_seen, crate::store::sqlite::to_ts(at(3)));
    }

    #[tokio::test]
    async fn price_drop_is_detected_across_runs() {
        let store = open_store().await;
        let settings = Settings::default();
        let pipeline = EnrichmentPipeline::new(&store, &settings);

        pipeline
            .run(&[snapshot("a", 1_000_000, "")], at(1))
            .await
            .unwrap();
        let enriched = pipeline
            .run(&[snapshot("a", 900_000, "")], at(2))
            .await
            .unwrap();

        assert!((enriched[0].price_drop_30d_ratio - 0.1).abs() < 1e-9);
        assert!(enriched[0].flags.is_price_drop);
        assert!(enriched[0]
            .reasons
            .iter()
            .any(|r| r.contains("30 days")));
    }

    #[tokio::test]
    async fn relist_correlates_with_inactive_sibling() {
        let store = open_store().await;
        let settings = Settings::default();
        let pipeline = EnrichmentPipeline::new(&store, &settings);

        // Run 1: old id active. Run 2: old id gone, flipped inactive at
        // reconciliation.
        let enriched = pipeline
            .run(&[snapshot("old", 950_000, "")], at(1))
            .await
            .unwrap();
        assert!(!enriched[0].is_relist);
        pipeline
            .run(&[snapshot("b", 700_000, "")], at(2))
            .await
            .unwrap();

        // Run 3: the same physical property under a fresh id.
        let mut relisted = snapshot("fresh", 940_000, "");
        relisted.address = "old Example St".to_string();
        let enriched = pipeline.run(&[relisted], at(3)).await.unwrap();
        assert!(enriched[0].is_relist);
        assert!(enriched[0].reasons.iter().any(|r| r.contains("relisting")));
    }

    #[tokio::test]
    async fn empty_batch_is_valid_and_reconciles() {
        let store = open_store().await;
        let settings = Settings::default();
        let pipeline = EnrichmentPipeline::new(&store, &settings);

        pipeline
            .run(&[snapshot("a", 950_000, "")], at(1))
            .await
            .unwrap();
        let enriched = pipeline.run(&[], at(2)).await.unwrap();
        assert!(enriched.is_empty());

        let row = store.get_current("a").await.unwrap().unwrap();
        assert_eq!(row.is_active, 0);
    }

    #[tokio::test]
    async fn keywords_contribute_to_score() {
        let store = open_store().await;
        let settings = Settings::default();
        let pipeline = EnrichmentPipeline::new(&store, &settings);

        let enriched = pipeline
            .run(
                &[snapshot("a", 990_000, "Priced to sell. Motivated seller!")],
                at(1),
            )
            .await
            .unwrap();
        assert!(enriched[0].flags.has_motivated_keywords);
        // 2 hits: 20 + 2*6
        assert!((enriched[0].score - 32.0).abs() < 1e-9);
    }
}
