//! Configuration module for strippi
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use strippi::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Indexing comics from: {}", config.site.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, HttpConfig, ScheduleConfig, SiteConfig, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

use crate::ConfigError;
use chrono::NaiveTime;

/// Parses a wall-clock time of day in `HH:MM` form
pub fn parse_time(text: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .map_err(|e| ConfigError::Validation(format!("invalid time of day '{}': {}", text, e)))
}
