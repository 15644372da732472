//! Trigger-table intent classification.
//!
//! Each intent carries a trigger-term set; the first intent in priority
//! order whose triggers overlap the query's tokens wins. The table is
//! constructor data so deployments can extend it without touching code.

use recall_core::types::Intent;

/// Priority-ordered (intent, trigger terms) table.
pub struct IntentRules {
    rules: Vec<(Intent, Vec<String>)>,
}

impl IntentRules {
    pub fn new(rules: Vec<(Intent, Vec<String>)>) -> Self {
        Self { rules }
    }

    /// Default trigger table. Priority: debugging, security, testing,
    /// optimization, implementation, explanation; `general` is the fallback.
    pub fn defaults() -> Self {
        let table: &[(Intent, &[&str])] = &[
            (
                Intent::Debugging,
                &[
                    "debug", "debugging", "error", "errors", "bug", "bugs", "fix", "broken",
                    "crash", "panic", "fail", "failing", "failure", "exception", "stacktrace",
                ],
            ),
            (
                Intent::Security,
                &[
                    "security", "secure", "vulnerability", "vulnerabilities", "audit", "auth",
                    "authentication", "authorization", "encrypt", "encryption", "exploit",
                    "injection", "sanitize", "cve",
                ],
            ),
            (
                Intent::Testing,
                &[
                    "test", "tests", "testing", "spec", "mock", "mocks", "coverage", "assert",
                    "assertion", "fixture", "regression",
                ],
            ),
            (
                Intent::Optimization,
                &[
                    "optimize", "optimization", "performance", "slow", "fast", "latency",
                    "throughput", "benchmark", "profiling", "speed", "memory",
                ],
            ),
            (
                Intent::Implementation,
                &[
                    "implement", "implementation", "build", "create", "add", "write", "develop",
                    "feature", "integrate", "design",
                ],
            ),
            (
                Intent::Explanation,
                &[
                    "explain", "explanation", "what", "how", "why", "understand", "meaning",
                    "describe", "overview", "documentation",
                ],
            ),
        ];
        Self::new(
            table
                .iter()
                .map(|(intent, triggers)| {
                    (*intent, triggers.iter().map(|t| (*t).to_string()).collect())
                })
                .collect(),
        )
    }

    /// Classify from the query's tokens (stop words included: interrogatives
    /// like "how"/"why" are explanation triggers).
    pub fn classify(&self, tokens: &[String]) -> Intent {
        for (intent, triggers) in &self.rules {
            if tokens.iter().any(|t| triggers.iter().any(|g| g == t)) {
                return *intent;
            }
        }
        Intent::General
    }
}

impl Default for IntentRules {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::tokenize;

    #[test]
    fn classifies_by_first_matching_rule() {
        let rules = IntentRules::defaults();
        assert_eq!(
            rules.classify(&tokenize("rust error handling")),
            Intent::Debugging
        );
        assert_eq!(
            rules.classify(&tokenize("write unit tests for the parser")),
            Intent::Testing
        );
        assert_eq!(
            rules.classify(&tokenize("jwt authentication middleware")),
            Intent::Security
        );
    }

    #[test]
    fn priority_order_breaks_overlaps() {
        let rules = IntentRules::defaults();
        // "fix" (debugging) outranks "implement" (implementation).
        assert_eq!(
            rules.classify(&tokenize("implement a fix for the login page")),
            Intent::Debugging
        );
    }

    #[test]
    fn falls_back_to_general() {
        let rules = IntentRules::defaults();
        assert_eq!(rules.classify(&tokenize("weather forecast")), Intent::General);
    }
}
