//! Intrasearch: an intranet crawler and full-text search engine
//!
//! This crate crawls a bounded set of intranet hosts, indexes the text of
//! every HTML page it reaches into a SQLite word table, and answers ranked,
//! snippet-highlighted search queries against that index.

pub mod config;
pub mod crawler;
pub mod search;
pub mod stats;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Intrasearch operations
#[derive(Debug, Error)]
pub enum IntraError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Search error: {0}")]
    Search(#[from] search::SearchError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Intrasearch operations
pub type Result<T> = std::result::Result<T, IntraError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crate::search::{search, SearchResult};
pub use crate::url::{standardize, LinkFilter};
