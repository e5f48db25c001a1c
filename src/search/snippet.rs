//! Context snippets around query matches

use regex::Regex;
use serde::Serialize;

/// Maximum number of snippets returned per result
pub const MAX_SNIPPETS: usize = 5;

/// Characters of context kept before a match
pub const LEFT_CONTEXT: usize = 20;

/// Characters of context kept after a match
pub const RIGHT_CONTEXT: usize = 80;

/// One highlighted occurrence of a query token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub left: String,
    pub keyword: String,
    pub right: String,
}

/// Compiled matcher for the tokens of one query
pub struct SnippetMatcher {
    pattern: Regex,
}

impl SnippetMatcher {
    /// Builds a case-insensitive alternation of the escaped tokens
    ///
    /// Returns `Ok(None)` when there is nothing to match.
    pub fn new(tokens: &[String]) -> Result<Option<Self>, regex::Error> {
        let mut alternatives: Vec<String> = Vec::new();
        for token in tokens {
            let escaped = regex::escape(token);
            if !token.is_empty() && !alternatives.contains(&escaped) {
                alternatives.push(escaped);
            }
        }

        if alternatives.is_empty() {
            return Ok(None);
        }

        let pattern = Regex::new(&format!(
            r"(?is)(.{{0,{}}})({})(.{{0,{}}})",
            LEFT_CONTEXT,
            alternatives.join("|"),
            RIGHT_CONTEXT
        ))?;

        Ok(Some(Self { pattern }))
    }

    /// Finds up to [`MAX_SNIPPETS`] non-overlapping matches in `text`
    ///
    /// Each match consumes its right-hand context, so the next snippet starts
    /// after it.
    pub fn snippets(&self, text: &str) -> Vec<Snippet> {
        self.pattern
            .captures_iter(text)
            .take(MAX_SNIPPETS)
            .filter_map(|caps| {
                Some(Snippet {
                    left: caps.get(1)?.as_str().to_string(),
                    keyword: caps.get(2)?.as_str().to_string(),
                    right: caps.get(3)?.as_str().to_string(),
                })
            })
            .collect()
    }
}
