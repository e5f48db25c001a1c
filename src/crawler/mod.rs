//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The deduplicated URL frontier
//! - HTTP probing, fetching and decoding
//! - Content extraction and link discovery
//! - Indexing of fetched pages
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod indexer;
mod parser;
mod state;

pub use coordinator::{run_crawl, Coordinator, CrawlContext, CrawlSummary};
pub use fetcher::{build_http_client, decode_body, fetch_body, probe, Probe};
pub use frontier::Frontier;
pub use indexer::Indexer;
pub use parser::{extract, ExtractedPage};
pub use state::{FetchState, FetchTracker};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that abandon a single URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Redirect status {0} without a Location header")]
    MissingLocation(u16),

    #[error("Invalid redirect target {0}")]
    InvalidRedirect(String),

    #[error("Page deadline of {0}s exceeded")]
    Timeout(u64),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Fetch task failed: {0}")]
    Task(String),
}
