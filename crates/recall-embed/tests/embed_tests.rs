use recall_core::config::EmbeddingSettings;
use recall_core::traits::EmbeddingProvider;
use recall_embed::{select_provider, HashEmbedder};

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(384, 256);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim is 384");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn empty_text_yields_zero_vector() {
    let embedder = HashEmbedder::new(128, 256);
    let embs = embedder.embed_batch(&["   ".to_string()]).expect("embed");
    assert!(embs[0].iter().all(|&x| x == 0.0));
}

#[test]
fn similar_texts_have_higher_cosine() {
    let embedder = HashEmbedder::new(384, 256);
    let embs = embedder
        .embed_batch(&[
            "rust async error handling".to_string(),
            "rust error handling patterns".to_string(),
            "cooking pasta recipes".to_string(),
        ])
        .expect("embed");
    let cos = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    assert!(
        cos(&embs[0], &embs[1]) > cos(&embs[0], &embs[2]),
        "overlapping terms score higher than unrelated text"
    );
}

#[test]
fn missing_model_falls_back_to_tagged_hash_provider() {
    let settings = EmbeddingSettings {
        provider: "model".to_string(),
        model_dir: Some("/nonexistent/model/dir".to_string()),
        ..EmbeddingSettings::default()
    };
    let provider = select_provider(&settings);
    assert!(
        provider.model_id().starts_with("hash:"),
        "fallback vectors must be detectable via the model id, got {}",
        provider.model_id()
    );
    assert_eq!(provider.dim(), settings.dim);
}
