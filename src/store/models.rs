/// Database row types for the three listing entities.
/// Timestamps are fixed-width RFC3339 UTC strings, so lexicographic order
/// in SQL matches chronological order.

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingCurrentRow {
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
    pub assessed: Option<i64>,
    pub desc_hash: String,
    pub first_seen: String,
    pub last_seen: String,
    pub is_active: i64,
    pub signature: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingEventRow {
    pub listing_id: String,
    pub event_time: String,
    pub event_type: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PresenceRow {
    pub listing_id: String,
    pub seen_time: String,
}
