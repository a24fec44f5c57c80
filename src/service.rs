//! Service facade
//!
//! Composes the index and the crawl engine into the caller-facing workflows:
//! refreshing the whole catalog, picking strips to post, and toggling daily
//! subscriptions. Delivery of the returned entries is the messaging layer's
//! job, not this crate's.

use crate::crawl::{CrawlEngine, CrawlReport};
use crate::fetch::{ComicListing, PageFetcher};
use crate::index::{Entry, Index, Source, SourceStats};
use crate::Result;
use chrono::NaiveDate;
use std::sync::Arc;

/// Outcome of one full refresh pass
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub sources: usize,
    pub new_entries: usize,
    pub failures: usize,
}

/// One scheduled daily post, ready for the messaging layer
#[derive(Debug, Clone)]
pub struct DailyPost {
    pub destination_id: i64,
    pub source_name: String,
    pub entry: Entry,
    pub caption: String,
}

/// Caller-facing facade over index + crawl engine
pub struct ComicService {
    index: Index,
    engine: CrawlEngine,
    fetcher: Arc<dyn PageFetcher>,
}

impl ComicService {
    pub fn new(index: Index, engine: CrawlEngine, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            index,
            engine,
            fetcher,
        }
    }

    // ===== Refresh =====

    /// Refreshes the catalog: upserts every listed source, then crawls each.
    ///
    /// A failure on one source is logged and counted; the pass always
    /// continues with the remaining sources.
    pub async fn refresh_all(&self) -> Result<RefreshReport> {
        let listings = self.fetcher.fetch_frontpage().await?;
        tracing::info!("Refreshing index for {} sources", listings.len());

        let mut report = RefreshReport::default();
        for listing in &listings {
            report.sources += 1;
            match self.refresh_source(listing).await {
                Ok(crawl) => report.new_entries += crawl.new_entries,
                Err(e) => {
                    tracing::warn!("Refresh of {} failed: {}", listing.name, e);
                    report.failures += 1;
                }
            }
        }

        tracing::info!(
            "Index refresh done: {} new entries, {} failures",
            report.new_entries,
            report.failures
        );
        Ok(report)
    }

    async fn refresh_source(&self, listing: &ComicListing) -> Result<CrawlReport> {
        self.index.upsert_source(&listing.name, &listing.url).await?;
        self.engine.crawl_source(listing).await
    }

    // ===== Posting =====

    /// Today's strip for a source; None is the normal nothing-to-post case
    pub async fn post_today(&self, source_name: &str) -> Result<Option<Entry>> {
        self.post_for_date(source_name, chrono::Local::now().date_naive())
            .await
    }

    pub async fn post_for_date(
        &self,
        source_name: &str,
        date: NaiveDate,
    ) -> Result<Option<Entry>> {
        Ok(self.index.entry_for_date(source_name, date).await?)
    }

    /// A uniformly random strip; None means the source has no entries yet
    pub async fn post_random(&self, source_name: &str) -> Result<Option<Entry>> {
        Ok(self.index.random_entry(source_name).await?)
    }

    /// Collects today's post for every subscription pair, skipping pairs
    /// with nothing to post
    pub async fn daily_posts(&self) -> Result<Vec<DailyPost>> {
        self.daily_posts_for_date(chrono::Local::now().date_naive())
            .await
    }

    pub async fn daily_posts_for_date(&self, date: NaiveDate) -> Result<Vec<DailyPost>> {
        let mut posts = Vec::new();
        for subscription in self.index.list_subscriptions().await? {
            let Some(entry) = self
                .index
                .entry_for_date(&subscription.source_name, date)
                .await?
            else {
                continue;
            };

            posts.push(DailyPost {
                destination_id: subscription.destination_id,
                caption: format!("{} of the day", subscription.source_name),
                source_name: subscription.source_name,
                entry,
            });
        }
        Ok(posts)
    }

    /// Records a remote upload identifier for later reuse. Best-effort: a
    /// storage failure here is logged, never propagated.
    pub async fn note_remote_upload(&self, image_ref: &str, file_id: &str) {
        if let Err(e) = self.index.set_remote_file_id(image_ref, file_id).await {
            tracing::warn!("Failed to record remote file id for {}: {}", image_ref, e);
        }
    }

    // ===== Subscriptions =====

    pub async fn subscribe(&self, destination_id: i64, source_name: &str) -> Result<()> {
        Ok(self.index.subscribe(destination_id, source_name).await?)
    }

    pub async fn unsubscribe(&self, destination_id: i64, source_name: &str) -> Result<()> {
        Ok(self.index.unsubscribe(destination_id, source_name).await?)
    }

    pub async fn is_subscribed(&self, destination_id: i64, source_name: &str) -> Result<bool> {
        Ok(self.index.is_subscribed(destination_id, source_name).await?)
    }

    /// Flips a destination's subscription; returns whether it is now enabled
    pub async fn toggle_subscription(
        &self,
        destination_id: i64,
        source_name: &str,
    ) -> Result<bool> {
        if self.is_subscribed(destination_id, source_name).await? {
            self.unsubscribe(destination_id, source_name).await?;
            Ok(false)
        } else {
            self.subscribe(destination_id, source_name).await?;
            Ok(true)
        }
    }

    pub async fn subscriptions_for_source(&self, source_name: &str) -> Result<Vec<i64>> {
        Ok(self.index.subscriptions_for_source(source_name).await?)
    }

    // ===== Catalog =====

    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        Ok(self.index.list_sources().await?)
    }

    pub async fn source_stats(&self) -> Result<Vec<SourceStats>> {
        Ok(self.index.source_stats().await?)
    }
}
