use recall_core::types::Intent;
use recall_query::QueryProcessor;

#[test]
fn process_enriches_a_raw_query() {
    let processor = QueryProcessor::with_defaults(6);
    let q = processor.process("  Rust ERROR   handling ").expect("process");

    assert_eq!(q.normalized, "rust error handling");
    assert_eq!(q.intent, Intent::Debugging);
    assert_eq!(q.key_terms, vec!["rust", "error", "handling"]);
    assert_eq!(q.expansions[0], "rust error handling", "original first");
    assert!(q.expansions.len() <= 6);
    assert!(q.expansions.len() > 1, "synonyms/keywords add variants");
}

#[test]
fn empty_query_is_rejected() {
    let processor = QueryProcessor::with_defaults(6);
    assert!(processor.process("   ").is_err());
    assert!(processor.process("").is_err());
}

#[test]
fn processing_is_a_pure_function_of_the_text() {
    let processor = QueryProcessor::with_defaults(6);
    let a = processor.process("optimize database queries").expect("a");
    let b = processor.process("optimize database queries").expect("b");
    assert_eq!(a.expansions, b.expansions);
    assert_eq!(a.intent, Intent::Optimization);
}
