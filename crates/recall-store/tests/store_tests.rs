use recall_core::types::Document;
use recall_embed::HashEmbedder;
use recall_store::{hash_content, EmbeddingStore};

async fn open_store(uri: &str) -> anyhow::Result<EmbeddingStore> {
    EmbeddingStore::open(uri, Box::new(HashEmbedder::new(128, 256))).await
}

async fn seed(store: &EmbeddingStore, id: &str, text: &str) -> anyhow::Result<()> {
    let hash = hash_content(text);
    store
        .upsert_document(&Document {
            id: id.to_string(),
            path: format!("/corpus/{id}.txt"),
            content_hash: hash.clone(),
            summary: Some(text.to_string()),
        })
        .await?;
    store.regenerate_embedding(id, text, &hash).await
}

#[tokio::test]
async fn similarity_search_ranks_overlapping_content_first() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = open_store(&tmp.path().to_string_lossy()).await?;

    seed(&store, "doc-a", "rust async error handling").await?;
    seed(&store, "doc-b", "python test coverage report").await?;
    seed(&store, "doc-c", "gardening tips for spring").await?;

    let q = store.embed("rust error handling")?;
    let hits = store.similarity_search(&q, 5, -1.0).await?;
    assert!(!hits.is_empty());
    assert_eq!(hits[0].0, "doc-a", "overlapping content ranks first");

    // Determinism: repeated calls return the identical ranked order.
    let again = store.similarity_search(&q, 5, -1.0).await?;
    let ids: Vec<_> = hits.iter().map(|h| h.0.clone()).collect();
    let ids_again: Vec<_> = again.iter().map(|h| h.0.clone()).collect();
    assert_eq!(ids, ids_again);

    // Cosine bounds hold for every returned score.
    for (_, score) in &hits {
        assert!(*score >= -1.0 - 1e-5 && *score <= 1.0 + 1e-5);
    }
    Ok(())
}

#[tokio::test]
async fn min_similarity_filters_results() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = open_store(&tmp.path().to_string_lossy()).await?;
    seed(&store, "doc-a", "rust async error handling").await?;
    seed(&store, "doc-c", "gardening tips for spring").await?;

    let q = store.embed("rust error handling")?;
    let strict = store.similarity_search(&q, 5, 0.99).await?;
    let loose = store.similarity_search(&q, 5, -1.0).await?;
    assert!(strict.len() < loose.len());
    for (_, score) in &strict {
        assert!(*score >= 0.99);
    }
    Ok(())
}

#[tokio::test]
async fn zero_query_vector_returns_empty() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = open_store(&tmp.path().to_string_lossy()).await?;
    seed(&store, "doc-a", "rust async error handling").await?;

    let zero = vec![0.0f32; store.dim()];
    let hits = store.similarity_search(&zero, 5, -1.0).await?;
    assert!(hits.is_empty(), "zero vectors have no defined similarity");
    Ok(())
}

#[tokio::test]
async fn re_embedding_overwrites_the_record() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = open_store(&tmp.path().to_string_lossy()).await?;
    seed(&store, "doc-a", "first version of the text").await?;
    let before = store.records().await?.len();

    seed(&store, "doc-a", "second version of the text").await?;
    let records = store.records().await?;
    assert_eq!(records.len(), before, "one record per (document, model)");
    assert_eq!(records[0].content_hash, hash_content("second version of the text"));
    Ok(())
}

#[tokio::test]
async fn stale_embeddings_are_excluded_until_regenerated() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = open_store(&tmp.path().to_string_lossy()).await?;
    seed(&store, "doc-a", "rust async error handling").await?;

    // Content changes upstream; the metadata hash moves but the embedding
    // is not regenerated yet.
    store
        .upsert_document(&Document {
            id: "doc-a".to_string(),
            path: "/corpus/doc-a.txt".to_string(),
            content_hash: hash_content("totally new content"),
            summary: None,
        })
        .await?;

    let q = store.embed("rust error handling")?;
    let hits = store.similarity_search(&q, 5, -1.0).await?;
    assert!(hits.iter().all(|(id, _)| id != "doc-a"));

    // Regeneration restores the document to scoring.
    store
        .regenerate_embedding("doc-a", "totally new content", &hash_content("totally new content"))
        .await?;
    let hits = store.similarity_search(&store.embed("totally new content")?, 5, -1.0).await?;
    assert!(hits.iter().any(|(id, _)| id == "doc-a"));
    Ok(())
}
