//! Page fetching module
//!
//! This module covers everything that talks to the newspaper site:
//! - Building the HTTP client
//! - The [`PageFetcher`] capability trait the crawl engine is written against
//! - The concrete archive implementation with its field extraction rules
//! - Display-date normalization

mod client;
mod date;
mod site;

pub use client::build_http_client;
pub use date::parse_date_text;
pub use site::SiteFetcher;

use crate::Result;
use async_trait::async_trait;

/// One comic series as listed on the archive frontpage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComicListing {
    pub name: String,
    /// Homepage of the series; crawling starts from here
    pub url: String,
}

/// Structured fields extracted from a single comic page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComicPage {
    /// Display date as printed on the page ("D.M.YYYY" or "D.M.")
    pub date_text: String,
    /// Location of the high-resolution strip image
    pub image_url: String,
    /// Link to the chronologically previous strip, absent at the start of
    /// history
    pub previous_url: Option<String>,
}

/// Capability to fetch and field-extract archive pages
///
/// The crawl engine only sees this trait; tests substitute an in-memory fake.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Lists all comic series available on the archive frontpage
    async fn fetch_frontpage(&self) -> Result<Vec<ComicListing>>;

    /// Resolves the URL of a series' latest strip from its homepage
    async fn fetch_latest_url(&self, homepage_url: &str) -> Result<String>;

    /// Fetches one strip page and extracts its fields
    async fn fetch_page(&self, url: &str) -> Result<ComicPage>;

    /// Downloads a strip image
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}
