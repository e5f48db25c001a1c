//! Query evaluation over the word index
//!
//! A query is tokenized with the same segmenter used at indexing time. Pages
//! holding at least one posting for any query token are counted, ranked by
//! title match tier and posting hits, paginated, and decorated with context
//! snippets around each match.

use crate::search::snippet::{Snippet, SnippetMatcher};
use crate::search::tokenizer::Tokenizer;
use crate::search::SearchError;
use crate::storage::{SearchRow, Storage};
use serde::Serialize;

/// Outcome of one search
///
/// `rows` is absent when the caller asked for a non-positive page size.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<SearchHit>>,
}

/// One ranked page with its snippets
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub standard_url: String,
    pub url: String,
    pub title: String,
    pub update_time: i64,
    pub word_hit_count: u64,
    pub appears: Vec<Snippet>,
}

/// Runs a query against the index
///
/// # Arguments
///
/// * `storage` - Index to query
/// * `tokenizer` - Segmenter shared with the indexer
/// * `query` - Raw query text
/// * `page` - 1-based page number; values below 1 are treated as 1
/// * `page_size` - Rows per page; zero or negative returns the count only
pub fn search(
    storage: &dyn Storage,
    tokenizer: &dyn Tokenizer,
    query: &str,
    page: i64,
    page_size: i64,
) -> Result<SearchResult, SearchError> {
    let tokens = tokenizer.cut(query);

    let count = if tokens.is_empty() {
        0
    } else {
        storage.count_matching_pages(&tokens)?
    };

    if page_size <= 0 {
        return Ok(SearchResult { count, rows: None });
    }

    let matcher = match SnippetMatcher::new(&tokens)? {
        Some(matcher) => matcher,
        None => {
            return Ok(SearchResult {
                count,
                rows: Some(Vec::new()),
            })
        }
    };

    let limit = page_size as u64;
    let offset = (page.max(1) as u64 - 1).saturating_mul(limit);
    let rows = storage.ranked_pages(&tokens, query, limit, offset)?;

    tracing::debug!(
        "Query {:?}: {} tokens, {} matching pages, {} rows on page {}",
        query,
        tokens.len(),
        count,
        rows.len(),
        page.max(1)
    );

    let rows = rows
        .into_iter()
        .map(|row| into_hit(row, &matcher))
        .collect();

    Ok(SearchResult {
        count,
        rows: Some(rows),
    })
}

fn into_hit(row: SearchRow, matcher: &SnippetMatcher) -> SearchHit {
    let text = format!("{} {}", row.title, row.content);
    SearchHit {
        appears: matcher.snippets(&text),
        standard_url: row.standard_url,
        url: row.url,
        title: row.title,
        update_time: row.update_time,
        word_hit_count: row.word_hit_count,
    }
}
