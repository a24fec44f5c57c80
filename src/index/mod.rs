//! Index module: the durable catalog of comic sources and entries
//!
//! This module handles all database state for the indexer, including:
//! - SQLite schema management
//! - Source, entry, and subscription persistence
//! - The single-writer serialization discipline (all statements execute on
//!   one dedicated thread, in submission order)

mod schema;
mod store;
mod writer;

pub use schema::initialize_schema;
pub use store::IndexStore;
pub use writer::Index;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during index operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid stored date: {0:?}")]
    InvalidDate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index writer is gone")]
    WorkerGone,
}

/// Result type for index operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A comic strip series tracked by name and homepage URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub url: String,
}

/// One dated, indexed instance of a source's comic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub source_name: String,
    pub date: NaiveDate,
    /// Filesystem reference to the stored strip image
    pub image_ref: String,
    /// Identifier of a previously-uploaded copy of the image, if any
    pub remote_file_id: Option<String>,
}

/// A destination's opt-in to a source's daily post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub destination_id: i64,
    pub source_name: String,
}

/// Per-source summary used by the stats output
#[derive(Debug, Clone)]
pub struct SourceStats {
    pub name: String,
    pub entry_count: u64,
    pub latest_date: Option<NaiveDate>,
}
