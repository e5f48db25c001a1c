//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{PageRecord, QueueEntry, SearchRow};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// All keys are standardized URLs (see [`crate::url::standardize`]); callers
/// are responsible for standardizing before calling in.
pub trait Storage {
    // ===== Frontier =====

    /// Returns true if the key is in the page store or the frontier
    fn is_known(&self, standard_url: &str) -> StorageResult<bool>;

    /// Adds a URL to the frontier unless its key is already known
    ///
    /// The known-check and the insert happen in a single statement, so two
    /// concurrent discoveries of the same URL enqueue it at most once.
    ///
    /// # Returns
    ///
    /// `true` if a new frontier entry was created
    fn enqueue(&mut self, standard_url: &str, url: &str) -> StorageResult<bool>;

    /// Removes and returns one arbitrary frontier entry
    fn dequeue(&mut self) -> StorageResult<Option<QueueEntry>>;

    /// Number of entries waiting in the frontier
    fn queue_len(&self) -> StorageResult<u64>;

    // ===== Pages and postings =====

    /// Replaces the page record for `page.standard_url` and all of its postings
    fn replace_page(&mut self, page: &PageRecord, words: &[String]) -> StorageResult<()>;

    /// Looks up a committed page by key
    fn get_page(&self, standard_url: &str) -> StorageResult<Option<PageRecord>>;

    /// Returns the postings of a page in insertion order
    fn get_postings(&self, standard_url: &str) -> StorageResult<Vec<String>>;

    // ===== Queries =====

    /// Counts distinct pages with at least one posting among `words`
    fn count_matching_pages(&self, words: &[String]) -> StorageResult<u64>;

    /// Returns one page of ranked rows for `words`
    ///
    /// Rows are ordered by `tier * 100000 - hits`, where tier is 1 when the
    /// title equals `query`, 2 when it contains `query`, and 3 otherwise.
    fn ranked_pages(
        &self,
        words: &[String],
        query: &str,
        limit: u64,
        offset: u64,
    ) -> StorageResult<Vec<SearchRow>>;

    // ===== Statistics =====

    fn count_pages(&self) -> StorageResult<u64>;

    fn count_postings(&self) -> StorageResult<u64>;

    fn count_distinct_words(&self) -> StorageResult<u64>;
}
