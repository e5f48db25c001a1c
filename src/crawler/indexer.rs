//! Indexer: persists a fetched page and its word postings

use crate::search::Tokenizer;
use crate::storage::{lock, PageRecord, SharedStorage, Storage, StorageResult};
use crate::url::standardize;
use chrono::Utc;
use std::sync::Arc;

/// Writes pages and postings through the shared store
#[derive(Clone)]
pub struct Indexer {
    storage: SharedStorage,
    tokenizer: Arc<dyn Tokenizer>,
}

impl Indexer {
    pub fn new(storage: SharedStorage, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { storage, tokenizer }
    }

    /// Replaces the page stored under `url`'s key and all of its postings
    ///
    /// Title and body are trimmed, `update_time` is set to now, and one
    /// posting is written per token of the title followed by the body.
    ///
    /// # Returns
    ///
    /// The number of postings written
    pub fn commit(&self, url: &str, title: &str, body: &str) -> StorageResult<usize> {
        let title = title.trim();
        let content = body.trim();

        // Segment before taking the lock
        let words = self.tokenizer.cut(&format!("{} {}", title, content));

        let page = PageRecord {
            standard_url: standardize(url),
            url: url.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            update_time: Utc::now().timestamp_millis(),
        };

        lock(&self.storage)?.replace_page(&page, &words)?;
        tracing::debug!("Indexed {} with {} postings", page.standard_url, words.len());

        Ok(words.len())
    }
}
