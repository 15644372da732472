use recall_core::config::EngineSettings;
use recall_core::types::{Intent, ResponseSource, SignalScores};

#[test]
fn default_weights_sum_to_one() {
    let s = EngineSettings::default();
    let sum = s.vector_weight + s.graph_weight + s.fuzzy_weight;
    assert!((sum - 1.0).abs() < 1e-6, "weights sum to 1.0, got {sum}");
    assert!(s.primary_threshold > s.secondary_threshold);
}

#[test]
fn signal_scores_best_and_count() {
    let none = SignalScores::default();
    assert_eq!(none.best(), 0.0);
    assert_eq!(none.strategy_count(), 0);

    let s = SignalScores {
        vector: Some(0.8),
        graph: None,
        fuzzy: Some(0.3),
    };
    assert_eq!(s.best(), 0.8);
    assert_eq!(s.strategy_count(), 2);
}

#[test]
fn wire_shapes_use_lowercase_tags() {
    let intent = serde_json::to_string(&Intent::Debugging).expect("serialize");
    assert_eq!(intent, "\"debugging\"");
    let source = serde_json::to_string(&ResponseSource::Cache).expect("serialize");
    assert_eq!(source, "\"cache\"");
}
