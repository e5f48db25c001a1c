//! Search module for querying the word index
//!
//! This module contains:
//! - The tokenizer shared with the indexer
//! - Ranked, paginated query evaluation
//! - Context snippet extraction
//! - The HTTP search API

mod engine;
mod server;
mod snippet;
mod tokenizer;

pub use engine::{search, SearchHit, SearchResult};
pub use server::{router, AppState, SearchServer};
pub use snippet::{Snippet, SnippetMatcher};
pub use tokenizer::{JiebaTokenizer, Tokenizer};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised while answering a query
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid snippet pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Search task failed: {0}")]
    Task(String),
}
