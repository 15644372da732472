//! Query understanding: normalization, intent classification, key-term
//! extraction, bounded expansion, and typo-tolerant matching. Everything
//! here is a pure function of the query text plus the configured tables.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod expand;
pub mod fuzzy;
pub mod intent;
pub mod terms;

use tracing::debug;

use recall_core::error::{Error, Result};
use recall_core::types::Intent;

use crate::expand::SynonymTable;
use crate::intent::IntentRules;

/// An enriched query, produced once per retrieval call and then discarded.
#[derive(Debug, Clone)]
pub struct ProcessedQuery {
    pub raw: String,
    /// Lowercased, whitespace-collapsed form; doubles as the cache key.
    pub normalized: String,
    pub intent: Intent,
    /// Ordered, deduplicated, stop-word-free terms.
    pub key_terms: Vec<String>,
    /// Query variants to search, original first. Bounded.
    pub expansions: Vec<String>,
}

pub struct QueryProcessor {
    rules: IntentRules,
    synonyms: SynonymTable,
    max_expansions: usize,
}

impl QueryProcessor {
    pub fn new(rules: IntentRules, synonyms: SynonymTable, max_expansions: usize) -> Self {
        Self {
            rules,
            synonyms,
            max_expansions,
        }
    }

    /// Processor with the default trigger and synonym tables.
    pub fn with_defaults(max_expansions: usize) -> Self {
        Self::new(IntentRules::defaults(), SynonymTable::defaults(), max_expansions)
    }

    pub fn process(&self, raw: &str) -> Result<ProcessedQuery> {
        let normalized = terms::normalize(raw);
        if normalized.is_empty() {
            return Err(Error::InvalidQuery(
                "query is empty after normalization".to_string(),
            ));
        }

        let tokens = terms::tokenize(&normalized);
        let intent = self.rules.classify(&tokens);
        let key_terms = terms::extract_key_terms(&normalized);
        let expansions = expand::expand_query(
            &normalized,
            &key_terms,
            intent,
            &self.synonyms,
            self.max_expansions,
        );
        debug!(%normalized, ?intent, terms = key_terms.len(), expansions = expansions.len(), "query processed");

        Ok(ProcessedQuery {
            raw: raw.to_string(),
            normalized,
            intent,
            key_terms,
            expansions,
        })
    }
}
