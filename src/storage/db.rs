//! SQLite storage layer for tag scores and ratings

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use super::models::{Category, ItemScore, Rating, Selections};

/// Lowest accepted star rating.
pub const MIN_RATING: u8 = 1;

/// Highest accepted star rating.
pub const MAX_RATING: u8 = 5;

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.migrate()?;
        Ok(db)
    }

    /// Run migrations
    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                category TEXT NOT NULL,
                name TEXT NOT NULL,
                total_score INTEGER NOT NULL DEFAULT 0,
                rating_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (category, name)
            );

            CREATE TABLE IF NOT EXISTS ratings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rating INTEGER NOT NULL,
                selections TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_ratings_created_at ON ratings(created_at);
            "#,
        )?;
        Ok(())
    }

    // ==================== Items ====================

    /// Insert every (category, name) pair with zero scores.
    ///
    /// Existing rows are left alone, so reseeding never loses feedback.
    pub fn seed_items<I, S>(&self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = (Category, S)>,
        S: AsRef<str>,
    {
        let mut stmt = self.conn.prepare(
            r#"
            INSERT OR IGNORE INTO items (category, name, total_score, rating_count)
            VALUES (?1, ?2, 0, 0)
            "#,
        )?;

        let mut inserted = 0;
        for (category, name) in items {
            inserted += stmt.execute(params![category.as_str(), name.as_ref()])?;
        }
        Ok(inserted)
    }

    /// All scores recorded for one category
    pub fn item_scores(&self, category: Category) -> Result<Vec<ItemScore>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, total_score, rating_count FROM items WHERE category = ?1 ORDER BY name",
        )?;

        let rows = stmt.query_map(params![category.as_str()], |row| {
            Ok(ItemScore {
                category,
                name: row.get(0)?,
                total_score: row.get(1)?,
                rating_count: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to load item scores")
    }

    // ==================== Ratings ====================

    /// Store a rating and credit it to every selected tag.
    ///
    /// Both writes happen in one transaction.
    pub fn record_rating(&self, rating: u8, selections: &Selections) -> Result<i64> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            bail!("Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}");
        }

        let selections_json = serde_json::to_string(selections)?;
        let created_at = Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO ratings (rating, selections, created_at) VALUES (?1, ?2, ?3)",
            params![rating, selections_json, created_at],
        )?;
        let id = tx.last_insert_rowid();

        for (category, name) in selections.iter() {
            tx.execute(
                r#"
                UPDATE items
                SET total_score = total_score + ?1,
                    rating_count = rating_count + 1
                WHERE category = ?2 AND name = ?3
                "#,
                params![rating, category.as_str(), name],
            )?;
        }
        tx.commit().context("Failed to commit rating")?;

        Ok(id)
    }

    /// Most recent ratings, newest first
    pub fn recent_ratings(&self, limit: usize) -> Result<Vec<Rating>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, rating, selections, created_at
             FROM ratings
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], Self::row_to_rating)?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list ratings")
    }

    fn row_to_rating(row: &rusqlite::Row) -> rusqlite::Result<Rating> {
        let selections_str: String = row.get(2)?;
        let created_at_str: String = row.get(3)?;

        let selections = serde_json::from_str(&selections_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?
            .with_timezone(&Utc);

        Ok(Rating {
            id: row.get(0)?,
            rating: row.get(1)?,
            selections,
            created_at,
        })
    }

    // ==================== Stats ====================

    /// Get total rating count
    pub fn rating_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ratings", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get total number of known tags
    pub fn item_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count)
    }
}
