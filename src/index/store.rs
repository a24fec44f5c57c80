//! Synchronous SQLite store
//!
//! `IndexStore` owns the database connection and implements one method per
//! catalog operation. It is not shared between threads directly; the [`Index`]
//! handle in `writer.rs` funnels all access through a single owning thread.
//!
//! [`Index`]: crate::index::Index

use crate::index::schema::initialize_schema;
use crate::index::{Entry, Source, SourceStats, StorageError, StorageResult, Subscription};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Date format used for the `entries.date` column
const DATE_FORMAT: &str = "%Y-%m-%d";

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_from_db(text: &str) -> StorageResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| StorageError::InvalidDate(text.to_string()))
}

/// Raw entry row before date decoding
struct EntryRow {
    source_name: String,
    date: String,
    image_ref: String,
    remote_file_id: Option<String>,
}

impl EntryRow {
    fn decode(self) -> StorageResult<Entry> {
        Ok(Entry {
            date: date_from_db(&self.date)?,
            source_name: self.source_name,
            image_ref: self.image_ref,
            remote_file_id: self.remote_file_id,
        })
    }
}

/// SQLite-backed catalog store
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    /// Opens (creating if missing) the database at the given path
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    // ===== Sources =====

    /// Inserts a source or updates its URL in place; repeat calls are no-ops
    pub fn upsert_source(&mut self, name: &str, url: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO sources (name, url) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET url = excluded.url",
            params![name, url],
        )?;
        Ok(())
    }

    pub fn list_sources(&self) -> StorageResult<Vec<Source>> {
        let mut stmt = self.conn.prepare("SELECT name, url FROM sources")?;
        let sources = stmt
            .query_map([], |row| {
                Ok(Source {
                    name: row.get(0)?,
                    url: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    // ===== Entries =====

    /// Returns the newest indexed date for a source, or None if it has no
    /// entries yet. Computed live; this is the crawl stop condition.
    pub fn latest_entry_date(&self, source_name: &str) -> StorageResult<Option<NaiveDate>> {
        let text: Option<String> = self.conn.query_row(
            "SELECT MAX(date) FROM entries WHERE source_name = ?1",
            params![source_name],
            |row| row.get(0),
        )?;

        text.as_deref().map(date_from_db).transpose()
    }

    /// Records a newly crawled entry. Returns false when an entry for this
    /// (source, date) already exists; the duplicate is silently ignored.
    pub fn append_entry(
        &mut self,
        source_name: &str,
        date: NaiveDate,
        image_ref: &str,
    ) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO entries (source_name, date, image_ref) VALUES (?1, ?2, ?3)",
            params![source_name, date_to_db(date), image_ref],
        )?;
        Ok(inserted > 0)
    }

    pub fn entry_for_date(
        &self,
        source_name: &str,
        date: NaiveDate,
    ) -> StorageResult<Option<Entry>> {
        let row = self
            .conn
            .query_row(
                "SELECT source_name, date, image_ref, remote_file_id FROM entries
                 WHERE source_name = ?1 AND date = ?2",
                params![source_name, date_to_db(date)],
                entry_row,
            )
            .optional()?;

        row.map(EntryRow::decode).transpose()
    }

    /// Picks one of the source's entries uniformly at random
    pub fn random_entry(&self, source_name: &str) -> StorageResult<Option<Entry>> {
        let row = self
            .conn
            .query_row(
                "SELECT source_name, date, image_ref, remote_file_id FROM entries
                 WHERE source_name = ?1 ORDER BY RANDOM() LIMIT 1",
                params![source_name],
                entry_row,
            )
            .optional()?;

        row.map(EntryRow::decode).transpose()
    }

    /// Backfills the remote upload identifier for an already-stored image
    pub fn set_remote_file_id(&mut self, image_ref: &str, file_id: &str) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE entries SET remote_file_id = ?2 WHERE image_ref = ?1",
            params![image_ref, file_id],
        )?;
        Ok(())
    }

    // ===== Subscriptions =====

    /// Enables daily posting of a source for a destination; idempotent
    pub fn subscribe(&mut self, destination_id: i64, source_name: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO subscriptions (destination_id, source_name) VALUES (?1, ?2)",
            params![destination_id, source_name],
        )?;
        Ok(())
    }

    /// Disables daily posting; removing an absent pair is a no-op
    pub fn unsubscribe(&mut self, destination_id: i64, source_name: &str) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM subscriptions WHERE destination_id = ?1 AND source_name = ?2",
            params![destination_id, source_name],
        )?;
        Ok(())
    }

    pub fn is_subscribed(&self, destination_id: i64, source_name: &str) -> StorageResult<bool> {
        let row: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM subscriptions WHERE destination_id = ?1 AND source_name = ?2",
                params![destination_id, source_name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    pub fn subscriptions_for_source(&self, source_name: &str) -> StorageResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT destination_id FROM subscriptions WHERE source_name = ?1")?;
        let destinations = stmt
            .query_map(params![source_name], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(destinations)
    }

    pub fn list_subscriptions(&self) -> StorageResult<Vec<Subscription>> {
        let mut stmt = self
            .conn
            .prepare("SELECT destination_id, source_name FROM subscriptions")?;
        let subscriptions = stmt
            .query_map([], |row| {
                Ok(Subscription {
                    destination_id: row.get(0)?,
                    source_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subscriptions)
    }

    // ===== Statistics =====

    pub fn source_stats(&self) -> StorageResult<Vec<SourceStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.name, COUNT(e.id), MAX(e.date)
             FROM sources s LEFT JOIN entries e ON e.source_name = s.name
             GROUP BY s.name ORDER BY s.name",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stats = Vec::with_capacity(rows.len());
        for (name, count, latest) in rows {
            stats.push(SourceStats {
                name,
                entry_count: count as u64,
                latest_date: latest.as_deref().map(date_from_db).transpose()?,
            });
        }
        Ok(stats)
    }
}

fn entry_row(row: &rusqlite::Row) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        source_name: row.get(0)?,
        date: row.get(1)?,
        image_ref: row.get(2)?,
        remote_file_id: row.get(3)?,
    })
}
