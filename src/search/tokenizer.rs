//! Word segmentation shared by indexing and querying
//!
//! Both sides must cut text the same way, otherwise query tokens would never
//! meet the postings they are supposed to match.

use jieba_rs::Jieba;

/// Splits text into an ordered sequence of word tokens
pub trait Tokenizer: Send + Sync {
    /// Cuts `text` into lowercase tokens, dropping whitespace and punctuation
    fn cut(&self, text: &str) -> Vec<String>;
}

/// Dictionary-based segmenter backed by `jieba-rs`
///
/// Han text is segmented into dictionary words; runs of Latin letters and
/// digits come out as whole words. Loading the dictionary is the expensive
/// part, so build one instance at startup and share it.
pub struct JiebaTokenizer {
    jieba: Jieba,
}

impl JiebaTokenizer {
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }
}

impl Default for JiebaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for JiebaTokenizer {
    fn cut(&self, text: &str) -> Vec<String> {
        self.jieba
            .cut(text, true)
            .into_iter()
            .filter_map(normalize_token)
            .collect()
    }
}

/// Keeps tokens that carry at least one letter or digit, lowercased
///
/// The segmenter keeps `.` inside Latin runs, so a word ending a sentence
/// arrives as `word.`; surrounding dots are trimmed.
fn normalize_token(token: &str) -> Option<String> {
    let token = token.trim().trim_matches('.');
    if token.chars().any(char::is_alphanumeric) {
        Some(token.to_lowercase())
    } else {
        None
    }
}
