//! Crawl engine
//!
//! Discovers not-yet-indexed strips for one source by walking backward from
//! the current latest page via "previous" links. The walk stops at the first
//! date that is already indexed, or at the start of history on a first run.
//! Because entries are keyed by (source, date), re-running a crawl is
//! idempotent and an aborted pass resumes naturally on the next run.

use crate::fetch::{parse_date_text, ComicListing, PageFetcher};
use crate::images::ImageStore;
use crate::index::Index;
use crate::Result;
use chrono::NaiveDate;
use std::sync::Arc;

/// Outcome of one source's crawl pass
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub new_entries: usize,
}

/// Backward crawler over one source's page history
pub struct CrawlEngine {
    fetcher: Arc<dyn PageFetcher>,
    index: Index,
    images: Arc<ImageStore>,
    max_depth: Option<u32>,
}

impl CrawlEngine {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        index: Index,
        images: Arc<ImageStore>,
        max_depth: Option<u32>,
    ) -> Self {
        Self {
            fetcher,
            index,
            images,
            max_depth,
        }
    }

    /// Crawls one source, writing every newly discovered entry to the index
    pub async fn crawl_source(&self, source: &ComicListing) -> Result<CrawlReport> {
        self.crawl_source_at(source, chrono::Local::now().date_naive())
            .await
    }

    /// Crawl with an explicit reference date for year inference
    pub async fn crawl_source_at(
        &self,
        source: &ComicListing,
        today: NaiveDate,
    ) -> Result<CrawlReport> {
        // Where the previous pass stopped; recomputed live, never cached
        let stop_date = self.index.latest_entry_date(&source.name).await?;

        let mut url = self.fetcher.fetch_latest_url(&source.url).await?;
        let mut report = CrawlReport::default();
        let mut depth: u32 = 0;

        loop {
            if self.max_depth.map(|cap| depth >= cap).unwrap_or(false) {
                tracing::debug!("{}: depth cap {} reached", source.name, depth);
                break;
            }

            let page = self.fetcher.fetch_page(&url).await?;
            let date = parse_date_text(&page.date_text, today)?;

            if stop_date.map(|stop| date <= stop).unwrap_or(false) {
                tracing::debug!("{} for {} already indexed", source.name, date);
                break;
            }

            // Image first, entry row second: a crash in between leaves an
            // orphan file, never a dangling reference.
            let bytes = self.fetcher.fetch_image(&page.image_url).await?;
            let image_ref = self.images.store(&source.name, &page.image_url, &bytes)?;

            if self.index.append_entry(&source.name, date, &image_ref).await? {
                tracing::debug!("indexed {} of {}", source.name, date);
                report.new_entries += 1;
            }

            depth += 1;
            match page.previous_url {
                Some(previous) => url = previous,
                None => {
                    tracing::debug!("{}: reached start of history", source.name);
                    break;
                }
            }
        }

        Ok(report)
    }
}
