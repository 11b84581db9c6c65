pub mod models;
pub mod sqlite;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{EventType, ListingSnapshot, UpsertOutcome};
use models::{ListingCurrentRow, ListingEventRow, PresenceRow};

pub use sqlite::SqliteStore;

/// Abstract persistence seam for the enrichment engine. The engine only
/// speaks this trait; the sqlite implementation lives in [`sqlite`].
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Idempotently ensures all entities and indexes exist.
    async fn initialize(&self) -> Result<()>;

    /// Inserts a new current row (first_seen = last_seen = observed_at) or
    /// updates the mutable fields and last_seen of an existing one,
    /// preserving first_seen. Reports whether the price changed.
    async fn upsert_current(
        &self,
        snapshot: &ListingSnapshot,
        signature: &str,
        desc_hash: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome>;

    /// Append-only event write. Duplicate calls append duplicate rows: each
    /// call records one material transition.
    async fn append_event(
        &self,
        listing_id: &str,
        event_type: EventType,
        old_value: Option<String>,
        new_value: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Appends a presence mark and refreshes active/last_seen.
    async fn mark_present(&self, listing_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Flips the listing inactive and appends exactly one `missing` event.
    /// Callers must only invoke this on the active → inactive transition.
    async fn mark_inactive(&self, listing_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Events for one listing within the trailing window, ascending by time.
    async fn history(
        &self,
        listing_id: &str,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ListingEventRow>>;

    /// Ids of all currently active listings, for run reconciliation.
    async fn current_active_ids(&self) -> Result<HashSet<String>>;

    /// Presence marks for one listing, ascending by time. Audit only —
    /// scoring never reads these.
    async fn presence_marks(&self, listing_id: &str) -> Result<Vec<PresenceRow>>;

    async fn get_current(&self, listing_id: &str) -> Result<Option<ListingCurrentRow>>;

    /// Time of the most recent `missing` event for the listing, if any.
    async fn latest_missing_at(&self, listing_id: &str) -> Result<Option<DateTime<Utc>>>;

    /// The most recently seen other listing sharing a signature, if any.
    /// Returns `(listing_id, is_active, last_seen)`.
    async fn latest_other_by_signature(
        &self,
        signature: &str,
        exclude_listing_id: &str,
    ) -> Result<Option<(String, bool, Option<DateTime<Utc>>)>>;
}
