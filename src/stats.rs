//! Statistics about the crawl and the index
//!
//! This module provides functionality for extracting and displaying
//! index statistics from the storage layer.

use crate::storage::{Storage, StorageResult};

/// Index statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStatistics {
    /// Committed pages
    pub pages: u64,

    /// URLs waiting in the frontier
    pub queued: u64,

    /// Word postings across all pages
    pub postings: u64,

    /// Distinct indexed words
    pub distinct_words: u64,
}

impl IndexStatistics {
    /// Average number of postings per committed page
    pub fn postings_per_page(&self) -> f64 {
        if self.pages == 0 {
            0.0
        } else {
            self.postings as f64 / self.pages as f64
        }
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<IndexStatistics> {
    Ok(IndexStatistics {
        pages: storage.count_pages()?,
        queued: storage.queue_len()?,
        postings: storage.count_postings()?,
        distinct_words: storage.count_distinct_words()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IndexStatistics) {
    println!("=== Index Statistics ===\n");

    println!("Crawl:");
    println!("  Pages indexed: {}", stats.pages);
    println!("  URLs in frontier: {}", stats.queued);
    println!();

    println!("Index:");
    println!("  Postings: {}", stats.postings);
    println!("  Distinct words: {}", stats.distinct_words);
    println!("  Postings per page: {:.1}", stats.postings_per_page());
}
