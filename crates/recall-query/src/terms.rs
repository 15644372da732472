//! Tokenization, normalization, and key-term extraction.

use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "do", "does", "did",
    "have", "has", "had", "how", "what", "when", "where", "which", "who", "why", "i", "me", "my",
    "we", "our", "you", "your", "it", "its", "this", "that", "these", "those", "to", "of", "in",
    "on", "for", "with", "and", "or", "not", "no", "can", "could", "should", "would", "will",
    "about", "into", "over", "under", "at", "by", "from", "as", "if", "then", "than", "so",
];

/// Lowercase and collapse whitespace. The result doubles as the cache key.
pub fn normalize(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split on non-alphanumeric boundaries and lowercase. Stop words kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Ordered key terms: lowercased, punctuation stripped, stop words removed,
/// deduplicated preserving first-seen order.
pub fn extract_key_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for token in tokenize(query) {
        if STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        if seen.insert(token.clone()) {
            out.push(token);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize("  Rust   ERROR\thandling "), "rust error handling");
    }

    #[test]
    fn key_terms_dedupe_preserving_order() {
        let terms = extract_key_terms("the error in error handling, and the handling");
        assert_eq!(terms, vec!["error", "handling"]);
    }

    #[test]
    fn key_terms_strip_punctuation() {
        let terms = extract_key_terms("async/await: error-handling?");
        assert_eq!(terms, vec!["async", "await", "error", "handling"]);
    }
}
