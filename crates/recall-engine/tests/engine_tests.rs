use std::collections::HashSet;

use recall_cache::LanceResultCache;
use recall_core::config::EngineSettings;
use recall_core::error::Error;
use recall_core::types::{Document, GraphEdge, Intent, ResponseSource, SignalKind};
use recall_embed::HashEmbedder;
use recall_engine::RetrievalEngine;
use recall_graph::{DisconnectedGraph, MemoryGraph};
use recall_store::{hash_content, EmbeddingStore};

struct Fixture {
    _store_dir: tempfile::TempDir,
    _cache_dir: tempfile::TempDir,
}

async fn seeded_store(dir: &tempfile::TempDir) -> anyhow::Result<EmbeddingStore> {
    let store = EmbeddingStore::open(
        &dir.path().to_string_lossy(),
        Box::new(HashEmbedder::new(128, 256)),
    )
    .await?;
    for (id, text) in [
        ("rust-async-errors", "rust async error handling"),
        ("python-coverage", "python test coverage"),
        ("garden-notes", "watering schedule for tomato plants"),
        ("security-guide", "security vulnerabilities found in dependencies"),
    ] {
        let hash = hash_content(text);
        store
            .upsert_document(&Document {
                id: id.to_string(),
                path: format!("/corpus/{id}.txt"),
                content_hash: hash.clone(),
                summary: Some(text.to_string()),
            })
            .await?;
        store.regenerate_embedding(id, text, &hash).await?;
    }
    Ok(store)
}

fn corpus_graph() -> MemoryGraph {
    let edge = |s: &str, t: &str| GraphEdge {
        source: s.to_string(),
        relationship: "references".to_string(),
        target: t.to_string(),
    };
    MemoryGraph::new(&[
        edge("rust-async-errors", "error-handling-guide"),
        edge("python-coverage", "test-fixtures-howto"),
    ])
}

async fn engine(
) -> anyhow::Result<(RetrievalEngine<MemoryGraph, LanceResultCache>, Fixture)> {
    let store_dir = tempfile::tempdir()?;
    let cache_dir = tempfile::tempdir()?;
    let store = seeded_store(&store_dir).await?;
    let cache = LanceResultCache::open(&cache_dir.path().to_string_lossy()).await?;
    let engine = RetrievalEngine::new(store, corpus_graph(), cache, EngineSettings::default());
    Ok((
        engine,
        Fixture {
            _store_dir: store_dir,
            _cache_dir: cache_dir,
        },
    ))
}

fn all_doc_ids(ctx: &recall_core::types::RankedContext) -> Vec<String> {
    ctx.primary_matches
        .iter()
        .chain(ctx.secondary_matches.iter())
        .map(|m| m.doc_id.clone())
        .collect()
}

#[tokio::test]
async fn end_to_end_hybrid_search() -> anyhow::Result<()> {
    let (engine, _fx) = engine().await?;
    let ctx = engine.search("rust error handling", 5).await?;

    assert_eq!(ctx.intent, Intent::Debugging);
    assert_eq!(ctx.source, ResponseSource::Search);
    assert!(ctx.nodes_found >= 1);
    assert_eq!(ctx.expanded_queries[0], "rust error handling");
    assert!(
        !ctx.primary_matches.is_empty(),
        "expected at least one primary match"
    );
    assert_eq!(ctx.primary_matches[0].doc_id, "rust-async-errors");
    Ok(())
}

#[tokio::test]
async fn multi_signal_hits_are_deduplicated() -> anyhow::Result<()> {
    let (engine, _fx) = engine().await?;
    let ctx = engine.search("rust error handling", 10).await?;

    let ids = all_doc_ids(&ctx);
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(ids.len(), unique.len(), "one candidate per document");

    let top = &ctx.primary_matches[0];
    assert!(
        top.strategies.contains(&SignalKind::Vector)
            && top.strategies.contains(&SignalKind::Graph),
        "top document was found by both vector and graph signals: {:?}",
        top.strategies
    );
    Ok(())
}

#[tokio::test]
async fn repeated_search_is_served_from_cache() -> anyhow::Result<()> {
    let (engine, _fx) = engine().await?;
    let first = engine.search("rust error handling", 5).await?;
    assert_eq!(first.source, ResponseSource::Search);

    let second = engine.search("rust error handling", 5).await?;
    assert_eq!(second.source, ResponseSource::Cache);
    assert_eq!(all_doc_ids(&first), all_doc_ids(&second));
    assert_eq!(first.intent, second.intent);

    // Normalization makes these the same key.
    let third = engine.search("  RUST   error HANDLING ", 5).await?;
    assert_eq!(third.source, ResponseSource::Cache);
    Ok(())
}

#[tokio::test]
async fn graph_outage_degrades_instead_of_failing() -> anyhow::Result<()> {
    let store_dir = tempfile::tempdir()?;
    let cache_dir = tempfile::tempdir()?;
    let store = seeded_store(&store_dir).await?;
    let cache = LanceResultCache::open(&cache_dir.path().to_string_lossy()).await?;
    let engine =
        RetrievalEngine::new(store, DisconnectedGraph, cache, EngineSettings::default());

    let ctx = engine.search("rust error handling", 5).await?;
    assert_eq!(ctx.source, ResponseSource::Degraded);
    assert!(
        all_doc_ids(&ctx).contains(&"rust-async-errors".to_string()),
        "vector+fuzzy still find the relevant document"
    );

    // Degraded results are not cached; the next call searches again.
    let again = engine.search("rust error handling", 5).await?;
    assert_eq!(again.source, ResponseSource::Degraded);
    Ok(())
}

#[tokio::test]
async fn misspelled_terms_are_recovered_by_the_fuzzy_pass() -> anyhow::Result<()> {
    let (engine, _fx) = engine().await?;
    let ctx = engine.search("securty audit", 5).await?;

    let ids = all_doc_ids(&ctx);
    assert!(
        ids.contains(&"security-guide".to_string()),
        "typo should still reach the security document, got {ids:?}"
    );
    let hit = ctx
        .primary_matches
        .iter()
        .chain(ctx.secondary_matches.iter())
        .find(|m| m.doc_id == "security-guide")
        .expect("present");
    assert!(hit.strategies.contains(&SignalKind::Fuzzy));
    Ok(())
}

#[tokio::test]
async fn empty_queries_are_rejected_without_searching() -> anyhow::Result<()> {
    let (engine, _fx) = engine().await?;
    match engine.search("   ", 5).await {
        Err(Error::InvalidQuery(_)) => Ok(()),
        other => panic!("expected InvalidQuery, got {other:?}"),
    }
}

#[tokio::test]
async fn unrelated_corpus_returns_empty_success() -> anyhow::Result<()> {
    let (engine, _fx) = engine().await?;
    let ctx = engine.search("quantum chromodynamics lattice", 5).await?;
    // No matches is a success, distinct from SearchUnavailable.
    assert!(ctx.primary_matches.is_empty());
    assert_eq!(ctx.source, ResponseSource::Search);
    Ok(())
}
