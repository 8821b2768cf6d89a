//! SQLite storage for ingested reviews and aggregate metadata.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use reviewsync_scrape::ExtractedReview;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One normalized review bound to its source, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
    pub source_id: String,
    pub author: String,
    pub country: String,
    pub rating: u8,
    pub body: String,
    pub posted: NaiveDate,
}

impl ReviewRecord {
    pub fn from_extracted(source_id: &str, review: ExtractedReview) -> Self {
        Self {
            source_id: source_id.to_string(),
            author: review.author,
            country: review.country,
            rating: review.rating,
            body: review.body,
            posted: review.posted,
        }
    }
}

/// Outcome of one write batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub inserted: usize,
    /// Records already present under the same natural key (or repeated
    /// within the batch).
    pub duplicates: usize,
    /// Records whose individual insert failed; logged and skipped.
    pub failed: usize,
}

/// Per-source aggregate rating metadata. One row per source, overwritten
/// wholesale on each aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateMetadata {
    pub source_id: String,
    pub total_reviews: i64,
    pub average_rating: f64,
    /// Star histogram, index 0 = 1 star.
    pub histogram: [i64; 5],
    pub updated_at: String,
}

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), DbError> {
        // Check schema version before applying DDL so migrations can add
        // columns that new indexes reference.
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.migrate_v1()?;
            self.conn.pragma_update(None, "user_version", 1)?;
        }

        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        Ok(())
    }

    /// v1 added the country column to databases created before it existed.
    fn migrate_v1(&self) -> Result<(), DbError> {
        match self.conn.execute(
            "ALTER TABLE reviews ADD COLUMN country TEXT NOT NULL DEFAULT 'US'",
            [],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(_, Some(ref msg)))
                if msg.contains("duplicate column name") || msg.contains("no such table") =>
            {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        self.conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn review_count(&self, source_id: &str) -> Result<i64, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM reviews WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Full replace: within one transaction, drop the source's prior rows
    /// and insert the current run's records. A transaction-level failure
    /// rolls back and leaves the store exactly as it was.
    pub fn replace_reviews(
        &mut self,
        source_id: &str,
        records: &[ReviewRecord],
    ) -> Result<WriteSummary, DbError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM reviews WHERE source_id = ?1",
            params![source_id],
        )?;
        let summary = insert_records(&tx, records)?;
        tx.commit()?;
        Ok(summary)
    }

    /// Incremental merge: insert only records absent by natural key. Each
    /// insert is independently durable, so a cancelled run leaves a valid
    /// partial superset.
    pub fn merge_reviews(&self, records: &[ReviewRecord]) -> Result<WriteSummary, DbError> {
        insert_records(&self.conn, records)
    }

    /// Star histogram for a source from stored rows, index 0 = 1 star.
    pub fn rating_histogram(&self, source_id: &str) -> Result<[i64; 5], DbError> {
        let mut histogram = [0i64; 5];
        let mut stmt = self.conn.prepare(
            "SELECT rating, COUNT(1) FROM reviews WHERE source_id = ?1 GROUP BY rating",
        )?;
        let rows = stmt.query_map(params![source_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (rating, count) = row?;
            if (1..=5).contains(&rating) {
                histogram[(rating - 1) as usize] = count;
            }
        }
        Ok(histogram)
    }

    pub fn upsert_metadata(&self, meta: &AggregateMetadata) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO source_metadata (
               source_id, total_reviews, average_rating,
               stars_1, stars_2, stars_3, stars_4, stars_5, updated_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(source_id) DO UPDATE SET
               total_reviews = excluded.total_reviews,
               average_rating = excluded.average_rating,
               stars_1 = excluded.stars_1,
               stars_2 = excluded.stars_2,
               stars_3 = excluded.stars_3,
               stars_4 = excluded.stars_4,
               stars_5 = excluded.stars_5,
               updated_at = excluded.updated_at",
            params![
                meta.source_id,
                meta.total_reviews,
                meta.average_rating,
                meta.histogram[0],
                meta.histogram[1],
                meta.histogram[2],
                meta.histogram[3],
                meta.histogram[4],
                meta.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_metadata(&self, source_id: &str) -> Result<Option<AggregateMetadata>, DbError> {
        self.conn
            .query_row(
                "SELECT source_id, total_reviews, average_rating,
                        stars_1, stars_2, stars_3, stars_4, stars_5, updated_at
                 FROM source_metadata WHERE source_id = ?1",
                params![source_id],
                |row| {
                    Ok(AggregateMetadata {
                        source_id: row.get(0)?,
                        total_reviews: row.get(1)?,
                        average_rating: row.get(2)?,
                        histogram: [
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                            row.get(7)?,
                        ],
                        updated_at: row.get(8)?,
                    })
                },
            )
            .optional()
            .map_err(DbError::from)
    }

    /// Distinct stored sources with their row counts, for the stats view.
    pub fn list_source_counts(&self) -> Result<Vec<(String, i64)>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT source_id, COUNT(1) FROM reviews GROUP BY source_id ORDER BY source_id",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}

/// Shared insert loop for both write modes. `ON CONFLICT DO NOTHING`
/// absorbs natural-key duplicates (stored or repeated within the batch);
/// any other per-record failure is logged and skipped, never aborting the
/// batch.
fn insert_records(conn: &Connection, records: &[ReviewRecord]) -> Result<WriteSummary, DbError> {
    let mut stmt = conn.prepare(
        "INSERT INTO reviews (source_id, author, country, rating, body, posted)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(source_id, author, body, posted) DO NOTHING",
    )?;

    let mut summary = WriteSummary::default();
    for record in records {
        let result = stmt.execute(params![
            record.source_id,
            record.author,
            record.country,
            record.rating,
            record.body,
            record.posted.to_string(),
        ]);
        match result {
            Ok(0) => summary.duplicates += 1,
            Ok(_) => summary.inserted += 1,
            Err(err) => {
                tracing::warn!(
                    source_id = %record.source_id,
                    author = %record.author,
                    error = %err,
                    "skipping review that failed to insert"
                );
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}
