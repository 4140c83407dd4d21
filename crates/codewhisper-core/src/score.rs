//! Keyword-weighted relevance scoring.
//!
//! ```text
//! score = 5 × name + 2 × dir + content
//!
//! name    = 3 per keyword found in the lowercased file name
//! dir     = 1 per keyword found in the lowercased containing directory
//! content = occurrences of each keyword in the first N characters of
//!           the file (case-insensitive, non-overlapping), summed
//! ```
//!
//! Every term is a count, so scores are non-negative and can only grow as
//! matches are added. Reading the file is the caller's job; an unreadable
//! file simply scores zero.

use std::path::Path;

use crate::keywords::KeywordSet;

/// Raw points for each keyword found in the file name.
pub const NAME_MATCH_POINTS: u64 = 3;
/// Multiplier applied to the aggregate name points.
pub const NAME_WEIGHT: u64 = 5;
/// Raw points for each keyword found in the directory path.
pub const DIR_MATCH_POINTS: u64 = 1;
/// Multiplier applied to the aggregate directory points.
pub const DIR_WEIGHT: u64 = 2;
/// Number of leading characters of a file inspected for content matches.
pub const DEFAULT_CONTENT_WINDOW: usize = 10_000;

/// Per-component breakdown of a relevance score, before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub name: u64,
    pub dir: u64,
    pub content: u64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u64 {
        NAME_WEIGHT * self.name + DIR_WEIGHT * self.dir + self.content
    }
}

/// Score a file's location (name and containing directory).
///
/// `relative` should be relative to the scan root so that the directory
/// the scan started from does not match every keyword.
pub fn score_path(relative: &Path, keywords: &KeywordSet) -> ScoreBreakdown {
    let file_name = relative
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let dir = relative
        .parent()
        .map(|p| p.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let name_hits = keywords
        .iter()
        .filter(|kw| file_name.contains(kw.as_str()))
        .count() as u64;
    let dir_hits = keywords
        .iter()
        .filter(|kw| dir.contains(kw.as_str()))
        .count() as u64;

    ScoreBreakdown {
        name: name_hits * NAME_MATCH_POINTS,
        dir: dir_hits * DIR_MATCH_POINTS,
        content: 0,
    }
}

/// Count keyword occurrences in the first `window` characters of `content`.
pub fn score_content(content: &str, keywords: &KeywordSet, window: usize) -> u64 {
    let preview: String = content.chars().take(window).collect::<String>().to_lowercase();
    keywords
        .iter()
        .map(|kw| preview.matches(kw.as_str()).count() as u64)
        .sum()
}

/// Full score breakdown for a readable file.
pub fn score_file(
    relative: &Path,
    content: &str,
    keywords: &KeywordSet,
    window: usize,
) -> ScoreBreakdown {
    ScoreBreakdown {
        content: score_content(content, keywords, window),
        ..score_path(relative, keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::extract_keywords;
    use proptest::prelude::*;

    fn kw(words: &[&str]) -> KeywordSet {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_name_match_weighting() {
        let b = score_path(Path::new("login.ts"), &kw(&["login"]));
        assert_eq!(b.name, 3);
        assert_eq!(b.dir, 0);
        assert_eq!(b.total(), 15);
    }

    #[test]
    fn test_dir_match_weighting() {
        let b = score_path(Path::new("auth/session.ts"), &kw(&["auth"]));
        assert_eq!(b.name, 0);
        assert_eq!(b.dir, 1);
        assert_eq!(b.total(), 2);
    }

    #[test]
    fn test_path_matching_is_case_insensitive() {
        let b = score_path(Path::new("Auth/LoginForm.tsx"), &kw(&["auth", "login"]));
        assert_eq!(b.name, 3);
        assert_eq!(b.dir, 1);
    }

    #[test]
    fn test_content_counts_every_occurrence() {
        let content = "login(); LOGIN; Login\nlogout";
        assert_eq!(score_content(content, &kw(&["login"]), DEFAULT_CONTENT_WINDOW), 3);
    }

    #[test]
    fn test_content_sums_over_keywords() {
        let content = "token refresh token session";
        assert_eq!(
            score_content(content, &kw(&["token", "session"]), DEFAULT_CONTENT_WINDOW),
            3
        );
    }

    #[test]
    fn test_content_window_is_respected() {
        let mut content = "x".repeat(DEFAULT_CONTENT_WINDOW);
        content.push_str("login login");
        assert_eq!(score_content(&content, &kw(&["login"]), DEFAULT_CONTENT_WINDOW), 0);
        assert_eq!(score_content(&content, &kw(&["login"]), DEFAULT_CONTENT_WINDOW + 5), 1);
    }

    #[test]
    fn test_window_counts_characters_not_bytes() {
        let content = format!("{}login", "é".repeat(10));
        assert_eq!(score_content(&content, &kw(&["login"]), 15), 1);
    }

    #[test]
    fn test_full_score() {
        let keywords = extract_keywords("como funciona o login");
        let content = "login ".repeat(5);
        let b = score_file(Path::new("auth/login.ts"), &content, &keywords, DEFAULT_CONTENT_WINDOW);
        assert_eq!(b.total(), 5 * 3 + 5);

        let other = score_file(
            Path::new("utils/math.ts"),
            "export const add = (a, b) => a + b;",
            &keywords,
            DEFAULT_CONTENT_WINDOW,
        );
        assert_eq!(other.total(), 0);
    }

    #[test]
    fn test_empty_keywords_score_zero() {
        let b = score_file(Path::new("a/b.rs"), "anything", &KeywordSet::new(), 100);
        assert_eq!(b.total(), 0);
    }

    proptest! {
        #[test]
        fn prop_extra_occurrence_never_decreases_score(
            content in "[a-z \\n]{0,200}",
            word in "[a-z]{3,8}",
        ) {
            let keywords = kw(&[word.as_str()]);
            let path = Path::new("src/lib.rs");
            let before = score_file(path, &content, &keywords, DEFAULT_CONTENT_WINDOW).total();
            let grown = format!("{} {}", content, word);
            let after = score_file(path, &grown, &keywords, DEFAULT_CONTENT_WINDOW).total();
            prop_assert!(after >= before);
        }
    }
}
