//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the strippi database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Comic strip series, keyed by human-readable name
CREATE TABLE IF NOT EXISTS sources (
    name TEXT PRIMARY KEY,
    url TEXT NOT NULL
);

-- One row per indexed strip; dates are stored as ISO-8601 text
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_name TEXT NOT NULL REFERENCES sources(name),
    date TEXT NOT NULL,
    image_ref TEXT NOT NULL,
    remote_file_id TEXT,
    UNIQUE(source_name, date)
);

CREATE INDEX IF NOT EXISTS idx_entries_source ON entries(source_name);

-- Destinations that want a source posted daily
CREATE TABLE IF NOT EXISTS subscriptions (
    destination_id INTEGER NOT NULL,
    source_name TEXT NOT NULL REFERENCES sources(name),
    UNIQUE(destination_id, source_name)
);

CREATE INDEX IF NOT EXISTS idx_subscriptions_source ON subscriptions(source_name);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
