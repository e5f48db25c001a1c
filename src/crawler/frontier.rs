//! The crawl frontier
//!
//! A deduplicated work queue kept in the store's `queue` table. A URL is
//! identified by its standardized key; once a key is in the page store, the
//! queue, or has been dequeued during this run, it is never enqueued again.

use crate::storage::{lock, SharedStorage, Storage, StorageError, StorageResult};
use crate::url::standardize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Keys and exact URLs handed out by `dequeue` during this run
#[derive(Debug, Default)]
struct Dispatched {
    keys: HashSet<String>,
    urls: HashSet<String>,
}

/// Handle to the frontier, cheap to clone into fetch tasks
///
/// Clones share the dispatched set.
#[derive(Clone)]
pub struct Frontier {
    storage: SharedStorage,
    dispatched: Arc<Mutex<Dispatched>>,
}

impl Frontier {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            storage,
            dispatched: Arc::new(Mutex::new(Dispatched::default())),
        }
    }

    fn dispatched(&self) -> StorageResult<MutexGuard<'_, Dispatched>> {
        self.dispatched
            .lock()
            .map_err(|_| StorageError::LockPoisoned)
    }

    /// Returns true if the URL's key is crawled, queued or already dispatched
    pub fn is_known(&self, url: &str) -> StorageResult<bool> {
        let key = standardize(url);
        if self.dispatched()?.keys.contains(&key) {
            return Ok(true);
        }
        lock(&self.storage)?.is_known(&key)
    }

    /// Queues a URL unless its key is already known
    ///
    /// # Returns
    ///
    /// `true` if the URL was newly queued
    pub fn enqueue(&self, url: &str) -> StorageResult<bool> {
        let key = standardize(url);
        // Held across the insert so a concurrent dequeue cannot slip between
        let dispatched = self.dispatched()?;
        if dispatched.keys.contains(&key) {
            return Ok(false);
        }
        lock(&self.storage)?.enqueue(&key, url)
    }

    /// Queues the target of a redirect from `source`
    ///
    /// A target sharing the source's key (`/dir` to `/dir/`, `http` to
    /// `https`) is queued as long as that exact URL has not been dispatched,
    /// so a loop between two spellings of one key stops after one round.
    pub fn enqueue_redirect(&self, target: &str, source: &str) -> StorageResult<bool> {
        let key = standardize(target);
        if key != standardize(source) {
            return self.enqueue(target);
        }

        let dispatched = self.dispatched()?;
        if dispatched.urls.contains(target) {
            return Ok(false);
        }
        lock(&self.storage)?.enqueue(&key, target)
    }

    /// Removes one pending URL, returning it as originally enqueued
    ///
    /// The key is remembered as dispatched for the rest of the run.
    pub fn dequeue(&self) -> StorageResult<Option<String>> {
        let mut dispatched = self.dispatched()?;
        let entry = lock(&self.storage)?.dequeue()?;

        Ok(entry.map(|entry| {
            dispatched.keys.insert(entry.standard_url);
            dispatched.urls.insert(entry.url.clone());
            entry.url
        }))
    }

    /// Number of pending URLs
    pub fn len(&self) -> StorageResult<u64> {
        lock(&self.storage)?.queue_len()
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}
