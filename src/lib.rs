//! Strippi: a comic strip archive indexer
//!
//! This crate indexes a newspaper's comic-strip archive by crawling backward
//! through each strip's page history, stores the discovered entries in SQLite,
//! and serves daily/random picks to subscribed destinations.

pub mod config;
pub mod crawl;
pub mod fetch;
pub mod images;
pub mod index;
pub mod schedule;
pub mod service;

use thiserror::Error;

/// Main error type for strippi operations
#[derive(Debug, Error)]
pub enum StrippiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected page structure at {url}: {message}")]
    PageStructure { url: String, message: String },

    #[error("Unrecognized date text: {0:?}")]
    DateFormat(String),

    #[error("Storage error: {0}")]
    Storage(#[from] index::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for strippi operations
pub type Result<T> = std::result::Result<T, StrippiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::{ComicListing, ComicPage, PageFetcher, SiteFetcher};
pub use index::{Entry, Index, Source};
pub use service::ComicService;
