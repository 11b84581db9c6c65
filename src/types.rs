use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Listing snapshot — one observation of a listing, as supplied by a source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSnapshot {
    pub listing_id: String,
    pub source: String,
    pub url: String,
    pub title: String,
    pub address: String,
    pub city: String,
    /// Asking price in whole currency units. Zero when the source had none.
    pub price: i64,
    #[serde(default)]
    pub beds: Option<f64>,
    #[serde(default)]
    pub baths: Option<f64>,
    #[serde(default)]
    pub sqft: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assessed_value: Option<i64>,
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PriceChange,
    Missing,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PriceChange => "price_change",
            EventType::Missing => "missing",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of upserting a snapshot into the current-listings table.
#[derive(Debug, Clone, Default)]
pub struct UpsertOutcome {
    pub price_changed: bool,
    pub old_price: Option<i64>,
}

// ---------------------------------------------------------------------------
// Enriched records
// ---------------------------------------------------------------------------

/// Flags for which scoring terms fired. Serialized flat into output records.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SignalFlags {
    pub is_below_assessed: bool,
    pub is_price_drop: bool,
    pub is_long_dom: bool,
    pub has_motivated_keywords: bool,
}

/// A snapshot plus everything the enrichment pass derived for it.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedListing {
    #[serde(flatten)]
    pub snapshot: ListingSnapshot,
    pub signature: String,
    pub dom_days: i64,
    pub price_drop_30d_ratio: f64,
    pub is_relist: bool,
    pub score: f64,
    pub reasons: Vec<String>,
    #[serde(flatten)]
    pub flags: SignalFlags,
}

// ---------------------------------------------------------------------------
// Output projections
// ---------------------------------------------------------------------------

/// Full ranked record for the top-K deals document.
#[derive(Debug, Clone, Serialize)]
pub struct DealRecord {
    pub listing_id: String,
    pub source: String,
    pub url: String,
    pub title: String,
    pub address: String,
    pub city: String,
    pub price: i64,
    pub beds: Option<f64>,
    pub baths: Option<f64>,
    pub sqft: Option<i64>,
    pub assessed_value: Option<i64>,
    pub dom_days: i64,
    pub price_drop_30d_ratio: f64,
    pub is_relist: bool,
    pub score: f64,
    pub reasons: Vec<String>,
}

impl From<&EnrichedListing> for DealRecord {
    fn from(e: &EnrichedListing) -> Self {
        Self {
            listing_id: e.snapshot.listing_id.clone(),
            source: e.snapshot.source.clone(),
            url: e.snapshot.url.clone(),
            title: e.snapshot.title.clone(),
            address: e.snapshot.address.clone(),
            city: e.snapshot.city.clone(),
            price: e.snapshot.price,
            beds: e.snapshot.beds,
            baths: e.snapshot.baths,
            sqft: e.snapshot.sqft,
            assessed_value: e.snapshot.assessed_value,
            dom_days: e.dom_days,
            price_drop_30d_ratio: e.price_drop_30d_ratio,
            is_relist: e.is_relist,
            score: e.score,
            reasons: e.reasons.clone(),
        }
    }
}

/// Condensed record for the fixed top-10 alerts document.
#[derive(Debug, Clone, Serialize)]
pub struct AlertRecord {
    pub listing_id: String,
    pub title: String,
    pub city: String,
    pub price: i64,
    pub url: String,
    pub score: f64,
    pub reasons: Vec<String>,
}

impl From<&EnrichedListing> for AlertRecord {
    fn from(e: &EnrichedListing) -> Self {
        Self {
            listing_id: e.snapshot.listing_id.clone(),
            title: e.snapshot.title.clone(),
            city: e.snapshot.city.clone(),
            price: e.snapshot.price,
            url: e.snapshot.url.clone(),
            score: e.score,
            reasons: e.reasons.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub mode: String,
    pub listing_count: usize,
    pub alert_count: usize,
    pub top_count: usize,
    pub run_frequency: String,
}
