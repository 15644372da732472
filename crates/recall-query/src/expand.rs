//! Bounded query expansion: synonym substitution from a fixed domain
//! vocabulary, singular/plural normalization, and intent-specific keyword
//! injection. The original query always comes first and the total number
//! of variants is capped to keep downstream search cost predictable.

use std::collections::HashMap;

use recall_core::types::Intent;

/// Domain synonym table mapping a term to its substitutes.
pub struct SynonymTable {
    map: HashMap<String, Vec<String>>,
}

impl SynonymTable {
    pub fn new(map: HashMap<String, Vec<String>>) -> Self {
        Self { map }
    }

    /// Default software-domain vocabulary. Pairs are bidirectional.
    pub fn defaults() -> Self {
        let pairs: &[(&str, &[&str])] = &[
            ("auth", &["authentication", "authorization"]),
            ("authentication", &["auth"]),
            ("db", &["database"]),
            ("database", &["db"]),
            ("config", &["configuration"]),
            ("configuration", &["config"]),
            ("perf", &["performance"]),
            ("performance", &["perf"]),
            ("err", &["error"]),
            ("error", &["exception", "failure"]),
            ("doc", &["documentation"]),
            ("docs", &["documentation"]),
            ("documentation", &["docs"]),
            ("async", &["asynchronous", "concurrent"]),
            ("fn", &["function"]),
            ("func", &["function"]),
            ("function", &["method"]),
            ("api", &["endpoint", "interface"]),
            ("cache", &["caching"]),
            ("log", &["logging"]),
            ("msg", &["message"]),
            ("sec", &["security"]),
        ];
        let map = pairs
            .iter()
            .map(|(k, vs)| {
                (
                    (*k).to_string(),
                    vs.iter().map(|v| (*v).to_string()).collect(),
                )
            })
            .collect();
        Self::new(map)
    }

    pub fn substitutes(&self, term: &str) -> Option<&[String]> {
        self.map.get(term).map(Vec::as_slice)
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Keywords injected per intent to steer expansion toward the kind of
/// content the caller is after.
fn intent_keywords(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Debugging => &["fix", "solution"],
        Intent::Implementation => &["pattern", "best practice"],
        Intent::Testing => &["test case"],
        Intent::Explanation => &["overview"],
        Intent::Optimization => &["performance"],
        Intent::Security => &["vulnerability"],
        Intent::General => &[],
    }
}

/// Trailing-s singular form for terms long enough that stripping is safe.
fn singularize(term: &str) -> Option<String> {
    if term.len() > 3 && term.ends_with('s') && !term.ends_with("ss") {
        Some(term[..term.len() - 1].to_string())
    } else {
        None
    }
}

/// Generate search variants for a normalized query. Original first; at most
/// `cap` strings total.
pub fn expand_query(
    normalized: &str,
    key_terms: &[String],
    intent: Intent,
    synonyms: &SynonymTable,
    cap: usize,
) -> Vec<String> {
    let mut out = vec![normalized.to_string()];

    let push = |candidate: String, out: &mut Vec<String>| {
        if out.len() < cap && !out.contains(&candidate) {
            out.push(candidate);
        }
    };

    // (a) synonym substitution, one variant per (term, substitute).
    for term in key_terms {
        if let Some(subs) = synonyms.substitutes(term) {
            for sub in subs {
                let variant = replace_word(normalized, term, sub);
                push(variant, &mut out);
            }
        }
    }

    // (b) singular/plural normalization across all key terms at once.
    let mut singular = normalized.to_string();
    for term in key_terms {
        if let Some(s) = singularize(term) {
            singular = replace_word(&singular, term, &s);
        }
    }
    push(singular, &mut out);

    // (c) intent keyword injection.
    for kw in intent_keywords(intent) {
        push(format!("{normalized} {kw}"), &mut out);
    }

    out
}

/// Whole-word replacement on a whitespace-normalized string.
fn replace_word(text: &str, from: &str, to: &str) -> String {
    text.split(' ')
        .map(|w| if w == from { to } else { w })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_query_comes_first() {
        let out = expand_query(
            "auth middleware",
            &["auth".to_string(), "middleware".to_string()],
            Intent::General,
            &SynonymTable::defaults(),
            6,
        );
        assert_eq!(out[0], "auth middleware");
        assert!(out.contains(&"authentication middleware".to_string()));
    }

    #[test]
    fn expansion_is_bounded() {
        let terms: Vec<String> = ["auth", "db", "config", "error", "docs", "api"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        let out = expand_query(
            "auth db config error docs api",
            &terms,
            Intent::Implementation,
            &SynonymTable::defaults(),
            6,
        );
        assert!(out.len() <= 6, "got {} expansions", out.len());
    }

    #[test]
    fn plural_terms_are_singularized() {
        let out = expand_query(
            "connection errors",
            &["connection".to_string(), "errors".to_string()],
            Intent::General,
            &SynonymTable::new(std::collections::HashMap::new()),
            6,
        );
        assert!(out.contains(&"connection error".to_string()));
    }

    #[test]
    fn intent_keywords_are_injected() {
        let out = expand_query(
            "retry queue",
            &["retry".to_string(), "queue".to_string()],
            Intent::Implementation,
            &SynonymTable::new(std::collections::HashMap::new()),
            6,
        );
        assert!(out.contains(&"retry queue pattern".to_string()));
        assert!(out.contains(&"retry queue best practice".to_string()));
    }
}
