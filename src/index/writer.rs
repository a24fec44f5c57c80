//! Single-writer access to the index
//!
//! All database access goes through one dedicated thread that owns the
//! [`IndexStore`]. Callers submit closures over a channel; each request
//! carries a oneshot reply slot, so statements execute strictly in submission
//! order and results come back to exactly one caller. Readers and the
//! scheduled refresh writer can therefore share the database without any
//! multi-writer locking, and every caller observes committed state only
//! (autocommit per statement, no cross-request transactions).

use crate::index::{
    Entry, IndexStore, Source, SourceStats, StorageError, StorageResult, Subscription,
};
use chrono::NaiveDate;
use std::path::Path;
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce(&mut IndexStore) + Send + 'static>;

/// Cloneable async handle to the index
///
/// Dropping every handle shuts the writer thread down.
#[derive(Clone)]
pub struct Index {
    jobs: mpsc::UnboundedSender<Job>,
}

impl Index {
    /// Opens the database at the given path and starts the writer thread
    pub fn open(path: &Path) -> StorageResult<Self> {
        // Open on the caller's thread so a broken database path fails fast
        let store = IndexStore::open(path)?;
        Self::spawn(store)
    }

    /// In-memory index (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::spawn(IndexStore::open_in_memory()?)
    }

    fn spawn(mut store: IndexStore) -> StorageResult<Self> {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();

        std::thread::Builder::new()
            .name("index-writer".to_string())
            .spawn(move || {
                while let Some(job) = queue.blocking_recv() {
                    job(&mut store);
                }
                tracing::debug!("index writer stopped");
            })?;

        Ok(Self { jobs })
    }

    /// Submits one operation to the writer thread and awaits its result
    async fn call<T, F>(&self, job: F) -> StorageResult<T>
    where
        F: FnOnce(&mut IndexStore) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        self.jobs
            .send(Box::new(move |store| {
                // The caller may have gone away; the operation still ran.
                let _ = reply.send(job(store));
            }))
            .map_err(|_| StorageError::WorkerGone)?;

        response.await.map_err(|_| StorageError::WorkerGone)?
    }

    // ===== Sources =====

    pub async fn upsert_source(&self, name: &str, url: &str) -> StorageResult<()> {
        let (name, url) = (name.to_string(), url.to_string());
        self.call(move |store| store.upsert_source(&name, &url)).await
    }

    pub async fn list_sources(&self) -> StorageResult<Vec<Source>> {
        self.call(|store| store.list_sources()).await
    }

    // ===== Entries =====

    pub async fn latest_entry_date(&self, source_name: &str) -> StorageResult<Option<NaiveDate>> {
        let source_name = source_name.to_string();
        self.call(move |store| store.latest_entry_date(&source_name))
            .await
    }

    /// Returns false when the (source, date) pair was already indexed
    pub async fn append_entry(
        &self,
        source_name: &str,
        date: NaiveDate,
        image_ref: &str,
    ) -> StorageResult<bool> {
        let (source_name, image_ref) = (source_name.to_string(), image_ref.to_string());
        self.call(move |store| store.append_entry(&source_name, date, &image_ref))
            .await
    }

    pub async fn entry_for_date(
        &self,
        source_name: &str,
        date: NaiveDate,
    ) -> StorageResult<Option<Entry>> {
        let source_name = source_name.to_string();
        self.call(move |store| store.entry_for_date(&source_name, date))
            .await
    }

    pub async fn random_entry(&self, source_name: &str) -> StorageResult<Option<Entry>> {
        let source_name = source_name.to_string();
        self.call(move |store| store.random_entry(&source_name)).await
    }

    pub async fn set_remote_file_id(&self, image_ref: &str, file_id: &str) -> StorageResult<()> {
        let (image_ref, file_id) = (image_ref.to_string(), file_id.to_string());
        self.call(move |store| store.set_remote_file_id(&image_ref, &file_id))
            .await
    }

    // ===== Subscriptions =====

    pub async fn subscribe(&self, destination_id: i64, source_name: &str) -> StorageResult<()> {
        let source_name = source_name.to_string();
        self.call(move |store| store.subscribe(destination_id, &source_name))
            .await
    }

    pub async fn unsubscribe(&self, destination_id: i64, source_name: &str) -> StorageResult<()> {
        let source_name = source_name.to_string();
        self.call(move |store| store.unsubscribe(destination_id, &source_name))
            .await
    }

    pub async fn is_subscribed(
        &self,
        destination_id: i64,
        source_name: &str,
    ) -> StorageResult<bool> {
        let source_name = source_name.to_string();
        self.call(move |store| store.is_subscribed(destination_id, &source_name))
            .await
    }

    pub async fn subscriptions_for_source(&self, source_name: &str) -> StorageResult<Vec<i64>> {
        let source_name = source_name.to_string();
        self.call(move |store| store.subscriptions_for_source(&source_name))
            .await
    }

    pub async fn list_subscriptions(&self) -> StorageResult<Vec<Subscription>> {
        self.call(|store| store.list_subscriptions()).await
    }

    // ===== Statistics =====

    pub async fn source_stats(&self) -> StorageResult<Vec<SourceStats>> {
        self.call(|store| store.source_stats()).await
    }
}
