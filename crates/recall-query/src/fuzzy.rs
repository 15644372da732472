//! Typo tolerance via bounded edit distance.

use strsim::levenshtein;

use crate::terms::tokenize;

/// Allowed edit distance for a term: 2 for terms longer than 4 characters,
/// 1 otherwise.
fn threshold(term: &str) -> usize {
    if term.chars().count() > 4 {
        2
    } else {
        1
    }
}

/// True when any token of `text` is within the edit-distance threshold of
/// `term`. Tolerates typos like "securty" against "security".
pub fn fuzzy_match(term: &str, text: &str) -> bool {
    let term = term.to_lowercase();
    let limit = threshold(&term);
    tokenize(text).iter().any(|token| {
        // Length pre-filter: distance is at least the length difference.
        if token.len().abs_diff(term.len()) > limit {
            return false;
        }
        levenshtein(&term, token) <= limit
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_single_typo() {
        assert!(fuzzy_match("securty", "security vulnerabilities found"));
    }

    #[test]
    fn rejects_unrelated_text() {
        assert!(!fuzzy_match("security", "completely unrelated text"));
    }

    #[test]
    fn short_terms_get_tight_threshold() {
        assert!(fuzzy_match("rust", "rusty nail"));
        assert!(!fuzzy_match("rust", "brush strokes"));
    }
}
