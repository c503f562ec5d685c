//! SQLite-backed work queue of recipe URLs.
//!
//! Rows move through three states: pending (0), scraped (1), failed (2).
//! The integer encoding is part of the on-disk contract; existing databases
//! keep working across versions.

use std::fmt;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("queue row {id} does not exist")]
    UnknownRow { id: i64 },
    #[error("invalid status value {value} in queue row")]
    InvalidStatus { value: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueStatus {
    Pending,
    Scraped,
    Failed,
}

impl QueueStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            QueueStatus::Pending => 0,
            QueueStatus::Scraped => 1,
            QueueStatus::Failed => 2,
        }
    }

    pub fn from_i64(value: i64) -> Result<Self, QueueError> {
        match value {
            0 => Ok(QueueStatus::Pending),
            1 => Ok(QueueStatus::Scraped),
            2 => Ok(QueueStatus::Failed),
            other => Err(QueueError::InvalidStatus { value: other }),
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Scraped => "scraped",
            QueueStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: i64,
    pub source: String,
    pub url: String,
    pub status: QueueStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Per-source row counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub source: String,
    pub pending: u64,
    pub scraped: u64,
    pub failed: u64,
}

pub struct RecipeQueue {
    conn: Connection,
}

impl RecipeQueue {
    /// Open or create the queue database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, QueueError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory queue, used by tests.
    pub fn open_in_memory() -> Result<Self, QueueError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, QueueError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS recipes (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                source     TEXT NOT NULL,
                url        TEXT NOT NULL,
                status     INTEGER NOT NULL DEFAULT 0,
                attempts   INTEGER NOT NULL DEFAULT 0,
                last_error TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (source, url)
            );
            CREATE INDEX IF NOT EXISTS idx_recipes_source_status
                ON recipes (source, status);",
        )?;
        Ok(Self { conn })
    }

    /// Insert a URL as pending. Returns `false` when the `(source, url)` pair
    /// is already queued.
    pub fn enqueue(&self, source: &str, url: &str) -> Result<bool, QueueError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO recipes (source, url) VALUES (?1, ?2)",
            params![source, url],
        )?;
        Ok(inserted > 0)
    }

    /// All pending rows for a source, oldest first.
    pub fn pending(&self, source: &str) -> Result<Vec<QueueEntry>, QueueError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source, url, status, attempts, last_error
             FROM recipes WHERE source = ?1 AND status = 0 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![source], row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row??);
        }
        Ok(entries)
    }

    pub fn pending_count(&self, source: &str) -> Result<u64, QueueError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE source = ?1 AND status = 0",
            params![source],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Fetch a single row by id.
    pub fn entry(&self, id: i64) -> Result<QueueEntry, QueueError> {
        self.conn
            .query_row(
                "SELECT id, source, url, status, attempts, last_error
                 FROM recipes WHERE id = ?1",
                params![id],
                row_to_entry,
            )
            .optional()?
            .ok_or(QueueError::UnknownRow { id })?
    }

    pub fn mark_scraped(&self, id: i64) -> Result<(), QueueError> {
        self.set_status(id, QueueStatus::Scraped, None)
    }

    pub fn mark_failed(&self, id: i64, error: &str) -> Result<(), QueueError> {
        self.set_status(id, QueueStatus::Failed, Some(error))
    }

    fn set_status(
        &self,
        id: i64,
        status: QueueStatus,
        error: Option<&str>,
    ) -> Result<(), QueueError> {
        let updated = self.conn.execute(
            "UPDATE recipes
             SET status = ?1,
                 attempts = attempts + 1,
                 last_error = ?2,
                 updated_at = datetime('now')
             WHERE id = ?3",
            params![status.as_i64(), error, id],
        )?;
        if updated == 0 {
            return Err(QueueError::UnknownRow { id });
        }
        Ok(())
    }

    /// Row counts grouped by source.
    pub fn stats(&self) -> Result<Vec<SourceStats>, QueueError> {
        let mut stmt = self.conn.prepare(
            "SELECT source, status, COUNT(*)
             FROM recipes GROUP BY source, status ORDER BY source",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut stats: Vec<SourceStats> = Vec::new();
        for row in rows {
            let (source, status, count) = row?;
            if stats.last().map(|s| s.source.as_str()) != Some(source.as_str()) {
                stats.push(SourceStats {
                    source: source.clone(),
                    ..SourceStats::default()
                });
            }
            if let Some(entry) = stats.last_mut() {
                match QueueStatus::from_i64(status)? {
                    QueueStatus::Pending => entry.pending = count as u64,
                    QueueStatus::Scraped => entry.scraped = count as u64,
                    QueueStatus::Failed => entry.failed = count as u64,
                }
            }
        }
        Ok(stats)
    }

    /// Return failed rows of a source to pending, clearing the error note.
    pub fn reset_failed(&self, source: &str) -> Result<usize, QueueError> {
        let reset = self.conn.execute(
            "UPDATE recipes
             SET status = 0, last_error = NULL, updated_at = datetime('now')
             WHERE source = ?1 AND status = 2",
            params![source],
        )?;
        Ok(reset)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<QueueEntry, QueueError>> {
    let id: i64 = row.get(0)?;
    let source: String = row.get(1)?;
    let url: String = row.get(2)?;
    let status: i64 = row.get(3)?;
    let attempts: i64 = row.get(4)?;
    let last_error: Option<String> = row.get(5)?;
    Ok(QueueStatus::from_i64(status).map(|status| QueueEntry {
        id,
        source,
        url,
        status,
        attempts: attempts as u32,
        last_error,
    }))
}
