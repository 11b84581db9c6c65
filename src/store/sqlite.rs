use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::error::{AppError, Result};
use crate::store::models::{ListingCurrentRow, ListingEventRow, PresenceRow};
use crate::store::ListingStore;
use crate::types::{EventType, ListingSnapshot, UpsertOutcome};

/// Fixed-width RFC3339 UTC string ("2026-08-28T12:00:00Z"). Lexicographic
/// comparison of these strings matches chronological order.
pub fn to_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// SQLite-backed [`ListingStore`]. One connection per run in WAL mode so
/// concurrent readers are never blocked by the writer; at most one writer
/// process is assumed.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(AppError::Database)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// In-memory store for tests. A single pooled connection kept alive for
    /// the pool's lifetime, since each sqlite memory connection is its own
    /// database.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(AppError::Database)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ListingStore for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings_current(
                listing_id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                address TEXT NOT NULL,
                city TEXT NOT NULL,
                price INTEGER NOT NULL,
                beds REAL,
                baths REAL,
                sqft INTEGER,
                assessed INTEGER,
                desc_hash TEXT NOT NULL,
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                is_active INTEGER NOT NULL,
                signature TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listing_events(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                listing_id TEXT NOT NULL,
                event_time TEXT NOT NULL,
                event_type TEXT NOT NULL,
                old_value TEXT,
                new_value TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listing_presence(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                listing_id TEXT NOT NULL,
                seen_time TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for ddl in [
            "CREATE INDEX IF NOT EXISTS idx_events_listing ON listing_events(listing_id)",
            "CREATE INDEX IF NOT EXISTS idx_events_time ON listing_events(event_time)",
            "CREATE INDEX IF NOT EXISTS idx_presence_listing ON listing_presence(listing_id)",
            "CREATE INDEX IF NOT EXISTS idx_signature ON listings_current(signature)",
        ] {
            sqlx::query(ddl).execute(&self.pool).await?;
        }

        Ok(())
    }

    async fn upsert_current(
        &self,
        snapshot: &ListingSnapshot,
        signature: &str,
        desc_hash: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        let seen = to_ts(observed_at);

        let existing = sqlx::query("SELECT price FROM listings_current WHERE listing_id = ?")
            .bind(&snapshot.listing_id)
            .fetch_optional(&self.pool)
            .await?;

        match existing {
            Some(row) => {
                let old_price: i64 = row.try_get("price")?;
                let price_changed = old_price != snapshot.price;
                sqlx::query(
                    r#"
                    UPDATE listings_current
                    SET source = ?, url = ?, title = ?, address = ?, city = ?,
                        price = ?, beds = ?, baths = ?, sqft = ?, assessed = ?,
                        desc_hash = ?, last_seen = ?, is_active = 1, signature = ?
                    WHERE listing_id = ?
                    "#,
                )
                .bind(&snapshot.source)
                .bind(&snapshot.url)
                .bind(&snapshot.title)
                .bind(&snapshot.address)
                .bind(&snapshot.city)
                .bind(snapshot.price)
                .bind(snapshot.beds)
                .bind(snapshot.baths)
                .bind(snapshot.sqft)
                .bind(snapshot.assessed_value)
                .bind(desc_hash)
                .bind(&seen)
                .bind(signature)
                .bind(&snapshot.listing_id)
                .execute(&self.pool)
                .await?;
                Ok(UpsertOutcome { price_changed, old_price: Some(old_price) })
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO listings_current(
                        listing_id, source, url, title, address, city, price,
                        beds, baths, sqft, assessed, desc_hash,
                        first_seen, last_seen, is_active, signature
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
                    "#,
                )
                .bind(&snapshot.listing_id)
                .bind(&snapshot.source)
                .bind(&snapshot.url)
                .bind(&snapshot.title)
                .bind(&snapshot.address)
                .bind(&snapshot.city)
                .bind(snapshot.price)
                .bind(snapshot.beds)
                .bind(snapshot.baths)
                .bind(snapshot.sqft)
                .bind(snapshot.assessed_value)
                .bind(desc_hash)
                .bind(&seen)
                .bind(&seen)
                .bind(signature)
                .execute(&self.pool)
                .await?;
                Ok(UpsertOutcome { price_changed: false, old_price: None })
            }
        }
    }

    async fn append_event(
        &self,
        listing_id: &str,
        event_type: EventType,
        old_value: Option<String>,
        new_value: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO listing_events(listing_id, event_time, event_type, old_value, new_value)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(listing_id)
        .bind(to_ts(at))
        .bind(event_type.as_str())
        .bind(old_value)
        .bind(new_value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_present(&self, listing_id: &str, at: DateTime<Utc>) -> Result<()> {
        let seen = to_ts(at);
        sqlx::query("INSERT INTO listing_presence(listing_id, seen_time) VALUES (?, ?)")
            .bind(listing_id)
            .bind(&seen)
            .execute(&self.pool)
            .await?;
        sqlx::query("UPDATE listings_current SET last_seen = ?, is_active = 1 WHERE listing_id = ?")
            .bind(&seen)
            .bind(listing_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_inactive(&self, listing_id: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE listings_current SET is_active = 0, last_seen = ? WHERE listing_id = ?")
            .bind(to_ts(at))
            .bind(listing_id)
            .execute(&self.pool)
            .await?;
        self.append_event(
            listing_id,
            EventType::Missing,
            None,
            Some("missing".to_string()),
            at,
        )
        .await
    }

    async fn history(
        &self,
        listing_id: &str,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ListingEventRow>> {
        let cutoff = to_ts(now - Duration::days(window_days));
        let rows = sqlx::query_as::<_, ListingEventRow>(
            "SELECT listing_id, event_time, event_type, old_value, new_value
             FROM listing_events
             WHERE listing_id = ? AND event_time >= ?
             ORDER BY event_time ASC",
        )
        .bind(listing_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn current_active_ids(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT listing_id FROM listings_current WHERE is_active = 1")
            .fetch_all(&self.pool)
            .await?;
        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            ids.insert(row.try_get::<String, _>("listing_id")?);
        }
        Ok(ids)
    }

    async fn presence_marks(&self, listing_id: &str) -> Result<Vec<PresenceRow>> {
        let rows = sqlx::query_as::<_, PresenceRow>(
            "SELECT listing_id, seen_time FROM listing_presence
             WHERE listing_id = ? ORDER BY seen_time ASC",
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_current(&self, listing_id: &str) -> Result<Option<ListingCurrentRow>> {
        let row = sqlx::query_as::<_, ListingCurrentRow>(
            "SELECT listing_id, source, url, title, address, city, price, beds, baths, sqft,
                    assessed, desc_hash, first_seen, last_seen, is_active, signature
             FROM listings_current WHERE listing_id = ?",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn latest_missing_at(&self, listing_id: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = sqlx::query_scalar(
            "SELECT event_time FROM listing_events
             WHERE listing_id = ? AND event_type = 'missing'
             ORDER BY event_time DESC LIMIT 1",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(raw.as_deref().and_then(parse_ts))
    }

    async fn latest_other_by_signature(
        &self,
        signature: &str,
        exclude_listing_id: &str,
    ) -> Result<Option<(String, bool, Option<DateTime<Utc>>)>> {
        let row = sqlx::query(
            "SELECT listing_id, is_active, last_seen FROM listings_current
             WHERE signature = ? AND listing_id != ?
             ORDER BY last_seen DESC LIMIT 1",
        )
        .bind(signature)
        .bind(exclude_listing_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let listing_id: String = row.try_get("listing_id")?;
                let is_active: i64 = row.try_get("is_active")?;
                let last_seen: Option<String> = row.try_get("last_seen")?;
                Ok(Some((
                    listing_id,
                    is_active != 0,
                    last_seen.as_deref().and_then(parse_ts),
                )))
            }
            None => Ok(None),
        }
    }
}
