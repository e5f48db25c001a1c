//! Storage module for persisting the crawl and the index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - The URL frontier (`queue` table)
//! - Page records (`page` table) and word postings (`word` table)
//! - The ranked queries behind search

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared between the crawl loop and its fetch tasks
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Locks a shared storage handle, mapping poisoning to a storage error
pub fn lock(storage: &SharedStorage) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// A committed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub standard_url: String,
    pub url: String,
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds of the last commit
    pub update_time: i64,
}

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub standard_url: String,
    pub url: String,
}

/// A page matched by a search, with its hit count
#[derive(Debug, Clone)]
pub struct SearchRow {
    pub standard_url: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub update_time: i64,
    pub word_hit_count: u64,
}
