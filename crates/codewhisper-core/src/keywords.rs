//! Prompt keyword extraction.
//!
//! Turns free text into the normalized keyword set used by the relevance
//! scorer:
//!
//! 1. Lowercase the input.
//! 2. Replace every character that is not alphanumeric, `_`, or whitespace
//!    with a space.
//! 3. Split on whitespace.
//! 4. Drop tokens of two characters or fewer, stopwords, and all-digit
//!    tokens.
//!
//! Classification uses Rust's `char` methods, which do not depend on the
//! process locale, so the same text always yields the same set.

use std::collections::BTreeSet;

/// A normalized, deduplicated keyword set.
pub type KeywordSet = BTreeSet<String>;

/// Portuguese and English function words that carry no relevance signal.
pub const STOPWORDS: &[&str] = &[
    "o", "a", "os", "as", "um", "uma", "de", "da", "do", "das", "dos", "e", "ou", "para", "por",
    "como", "que", "se", "em", "na", "no", "com", "sem", "the", "an", "of", "to", "in", "on",
    "with", "for", "from", "by", "and", "or", "but", "is", "are", "was", "were",
];

/// Minimum token length (in characters) for a keyword, exclusive.
const MIN_KEYWORD_LEN: usize = 2;

/// Extract the keyword set from a prompt.
pub fn extract_keywords(text: &str) -> KeywordSet {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    normalized
        .split_whitespace()
        .filter(|token| is_keyword(token))
        .map(str::to_string)
        .collect()
}

fn is_keyword(token: &str) -> bool {
    token.chars().count() > MIN_KEYWORD_LEN
        && !STOPWORDS.contains(&token)
        && !token.chars().all(char::is_numeric)
}
