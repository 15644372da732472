//! Retrieval orchestrator: blends vector similarity, graph traversal, and
//! fuzzy term matching into one ranked context, with a TTL'd result cache
//! in front. The pipeline is fixed; there is no state between calls.
//!
//! Failure semantics: a dead signal source degrades the response (tagged),
//! it never fails the request. Only the loss of every source surfaces as a
//! hard error, so callers can tell "no matches" from "system down".

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use recall_core::config::EngineSettings;
use recall_core::error::{Error, Result};
use recall_core::traits::{GraphAccessor, ResultCache};
use recall_core::types::{
    Candidate, Document, DocumentId, RankedContext, ResponseSource, ScoredMatch, SignalKind,
    SignalScores,
};
use recall_query::{terms, ProcessedQuery, QueryProcessor};
use recall_store::EmbeddingStore;

/// Floor for fuzzy-only candidates; matched-term fraction fills the rest.
const FUZZY_BASE: f32 = 0.4;

pub struct RetrievalEngine<G, C>
where
    G: GraphAccessor,
    C: ResultCache,
{
    store: EmbeddingStore,
    graph: G,
    cache: C,
    processor: QueryProcessor,
    settings: EngineSettings,
}

/// Which signal sources answered during one call.
#[derive(Debug, Clone, Copy)]
struct SourceHealth {
    vector: bool,
    graph: bool,
    fuzzy: bool,
}

impl SourceHealth {
    fn degraded(&self) -> bool {
        !(self.vector && self.graph && self.fuzzy)
    }

    fn all_down(&self) -> bool {
        !(self.vector || self.graph || self.fuzzy)
    }
}

impl<G, C> RetrievalEngine<G, C>
where
    G: GraphAccessor,
    C: ResultCache,
{
    pub fn new(store: EmbeddingStore, graph: G, cache: C, settings: EngineSettings) -> Self {
        let processor = QueryProcessor::with_defaults(settings.max_expansions);
        Self::with_processor(store, graph, cache, processor, settings)
    }

    /// Engine with custom intent/synonym tables.
    pub fn with_processor(
        store: EmbeddingStore,
        graph: G,
        cache: C,
        processor: QueryProcessor,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            graph,
            cache,
            processor,
            settings,
        }
    }

    /// Ingestion pass-through to the embedding store.
    pub async fn regenerate_embedding(
        &self,
        doc_id: &str,
        text: &str,
        content_hash: &str,
    ) -> anyhow::Result<()> {
        self.store.regenerate_embedding(doc_id, text, content_hash).await
    }

    /// Corpus-change signal for a single query key.
    pub async fn invalidate(&self, query: &str) -> anyhow::Result<()> {
        self.cache.invalidate(&terms::normalize(query)).await
    }

    /// The caller-facing hybrid search.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<RankedContext> {
        let q = self.processor.process(query)?;

        // Step 1: cache probe. Any cache failure is just a miss.
        if let Some(hit) = self.cache_probe(&q.normalized).await {
            info!(key = %q.normalized, "cache hit");
            return Ok(hit);
        }

        // Steps 2-4: fan out per-expansion sub-queries, then the fuzzy pass.
        let (mut signals, mut health) = self.gather_signals(&q).await;
        let documents = self.load_documents(&mut health).await;
        self.fuzzy_pass(&q, &documents, &mut signals, &health);

        if health.all_down() {
            warn!("every signal source failed");
            return Err(Error::SearchUnavailable);
        }

        // Steps 5-8: merge, rank, truncate, classify.
        let candidates = self.merge(signals);
        let nodes_found = candidates.len();
        let context = self.assemble(&q, candidates, &documents, max_results, nodes_found, &health);

        // Step 9: store for next time. Degraded results are never cached.
        if context.source == ResponseSource::Search {
            self.cache_store(&q.normalized, &context).await;
        }

        info!(
            intent = ?context.intent,
            nodes_found,
            primary = context.primary_matches.len(),
            secondary = context.secondary_matches.len(),
            degraded = health.degraded(),
            "search complete"
        );
        Ok(context)
    }

    async fn cache_probe(&self, key: &str) -> Option<RankedContext> {
        let timeout = Duration::from_millis(self.settings.sub_query_timeout_ms);
        match tokio::time::timeout(timeout, self.cache.get(key)).await {
            Ok(Ok(Some(payload))) => match serde_json::from_str::<RankedContext>(&payload) {
                Ok(mut ctx) => {
                    ctx.source = ResponseSource::Cache;
                    Some(ctx)
                }
                Err(e) => {
                    warn!(error = %e, "undecodable cache entry ignored");
                    None
                }
            },
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                warn!(error = %e, "cache get failed, treating as miss");
                None
            }
            Err(_) => {
                warn!("cache get timed out, treating as miss");
                None
            }
        }
    }

    async fn cache_store(&self, key: &str, context: &RankedContext) {
        let ttl = Duration::from_secs(self.settings.cache_ttl_secs);
        let timeout = Duration::from_millis(self.settings.sub_query_timeout_ms);
        match serde_json::to_string(context) {
            Ok(payload) => {
                match tokio::time::timeout(timeout, self.cache.put(key, &payload, ttl)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(error = %e, "cache put failed"),
                    Err(_) => warn!("cache put timed out"),
                }
            }
            Err(e) => warn!(error = %e, "cache payload serialization failed"),
        }
    }

    /// Run similarity search and graph lookup for the original query and
    /// every expansion, concurrently. The merge below is the barrier.
    async fn gather_signals(
        &self,
        q: &ProcessedQuery,
    ) -> (HashMap<DocumentId, SignalScores>, SourceHealth) {
        let timeout = Duration::from_millis(self.settings.sub_query_timeout_ms);

        let sub_queries = q.expansions.iter().map(|expansion| async move {
            let vector = match self.store.embed(expansion) {
                Ok(vec) => {
                    match tokio::time::timeout(
                        timeout,
                        self.store.similarity_search(
                            &vec,
                            self.settings.top_k,
                            self.settings.min_similarity,
                        ),
                    )
                    .await
                    {
                        Ok(Ok(hits)) => Some(hits),
                        Ok(Err(e)) => {
                            warn!(error = %e, expansion = %expansion, "vector sub-query failed");
                            None
                        }
                        Err(_) => {
                            warn!(expansion = %expansion, "vector sub-query timed out");
                            None
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, expansion = %expansion, "embedding failed");
                    None
                }
            };

            let graph_terms = terms::extract_key_terms(expansion);
            let graph = match tokio::time::timeout(timeout, self.graph.related(&graph_terms)).await
            {
                Ok(Ok(hits)) => Some(hits),
                Ok(Err(e)) => {
                    warn!(error = %e, expansion = %expansion, "graph sub-query failed");
                    None
                }
                Err(_) => {
                    warn!(expansion = %expansion, "graph sub-query timed out");
                    None
                }
            };

            (vector, graph)
        });
        let outcomes = join_all(sub_queries).await;

        let mut signals: HashMap<DocumentId, SignalScores> = HashMap::new();
        let mut vector_ok = false;
        let mut graph_ok = false;
        for (vector, graph) in outcomes {
            if let Some(hits) = vector {
                vector_ok = true;
                for (doc_id, cosine) in hits {
                    // Cosine is in [-1, 1]; the negative half carries no
                    // relevance, so the normalized signal clamps at zero.
                    let score = cosine.max(0.0);
                    let entry = signals.entry(doc_id).or_default();
                    entry.vector = Some(entry.vector.map_or(score, |s| s.max(score)));
                }
            }
            if let Some(hits) = graph {
                graph_ok = true;
                for hit in hits {
                    let entry = signals.entry(hit.doc_id).or_default();
                    entry.graph = Some(entry.graph.map_or(hit.relevance, |s| s.max(hit.relevance)));
                }
            }
        }
        debug!(
            candidates = signals.len(),
            vector_ok, graph_ok, "signal gathering complete"
        );

        (
            signals,
            SourceHealth {
                vector: vector_ok,
                graph: graph_ok,
                fuzzy: true,
            },
        )
    }

    /// Document metadata feeds the fuzzy pass and result presentation. Its
    /// loss takes the fuzzy signal down with it.
    async fn load_documents(&self, health: &mut SourceHealth) -> HashMap<DocumentId, Document> {
        let timeout = Duration::from_millis(self.settings.sub_query_timeout_ms);
        match tokio::time::timeout(timeout, self.store.documents()).await {
            Ok(Ok(docs)) => docs.into_iter().map(|d| (d.id.clone(), d)).collect(),
            Ok(Err(e)) => {
                warn!(error = %e, "document metadata scan failed");
                health.fuzzy = false;
                HashMap::new()
            }
            Err(_) => {
                warn!("document metadata scan timed out");
                health.fuzzy = false;
                HashMap::new()
            }
        }
    }

    /// Step 4: key terms with no confident vector/graph coverage are
    /// re-sought with edit-distance matching over summaries and paths.
    /// This is what tolerates a misspelled query.
    fn fuzzy_pass(
        &self,
        q: &ProcessedQuery,
        documents: &HashMap<DocumentId, Document>,
        signals: &mut HashMap<DocumentId, SignalScores>,
        health: &SourceHealth,
    ) {
        if !health.fuzzy || q.key_terms.is_empty() {
            return;
        }

        let uncovered: Vec<&String> = q
            .key_terms
            .iter()
            .filter(|term| !self.term_covered(term.as_str(), signals, documents))
            .collect();
        if uncovered.is_empty() {
            return;
        }
        debug!(?uncovered, "fuzzy pass for uncovered terms");

        for (doc_id, doc) in documents {
            let haystack = match &doc.summary {
                Some(summary) => format!("{} {}", doc.path, summary),
                None => doc.path.clone(),
            };
            let matched = uncovered
                .iter()
                .filter(|term| recall_query::fuzzy::fuzzy_match(term.as_str(), &haystack))
                .count();
            if matched == 0 {
                continue;
            }
            let score = FUZZY_BASE + (1.0 - FUZZY_BASE) * (matched as f32 / q.key_terms.len() as f32);
            let entry = signals.entry(doc_id.clone()).or_default();
            entry.fuzzy = Some(entry.fuzzy.map_or(score, |s| s.max(score)));
        }
    }

    /// A term counts as covered when a confident vector/graph candidate's
    /// metadata already mentions it.
    fn term_covered(
        &self,
        term: &str,
        signals: &HashMap<DocumentId, SignalScores>,
        documents: &HashMap<DocumentId, Document>,
    ) -> bool {
        signals.iter().any(|(doc_id, scores)| {
            let confident = scores.vector.unwrap_or(0.0) >= self.settings.fuzzy_trigger_confidence
                || scores.graph.unwrap_or(0.0) >= self.settings.fuzzy_trigger_confidence;
            if !confident {
                return false;
            }
            match documents.get(doc_id) {
                Some(doc) => {
                    doc.path.to_lowercase().contains(term)
                        || doc
                            .summary
                            .as_deref()
                            .is_some_and(|s| s.to_lowercase().contains(term))
                }
                None => doc_id.to_lowercase().contains(term),
            }
        })
    }

    /// Step 5: one candidate per document. The smart score starts from the
    /// strongest signal and adds weighted support from the others, bounded
    /// so stacked weak signals cannot outrun a single strong one.
    fn merge(&self, signals: HashMap<DocumentId, SignalScores>) -> Vec<Candidate> {
        let w = &self.settings;
        signals
            .into_iter()
            .map(|(doc_id, scores)| {
                let weighted = [
                    (scores.vector, w.vector_weight, SignalKind::Vector),
                    (scores.graph, w.graph_weight, SignalKind::Graph),
                    (scores.fuzzy, w.fuzzy_weight, SignalKind::Fuzzy),
                ];
                let base = scores.best();
                let support: f32 = weighted
                    .iter()
                    .filter_map(|(s, weight, _)| s.map(|v| v * weight))
                    .sum::<f32>()
                    - base
                        * weighted
                            .iter()
                            .find(|(s, _, _)| s.is_some_and(|v| v == base))
                            .map_or(0.0, |(_, weight, _)| *weight);
                let smart_score = (base + support).min(base * w.combination_cap);
                let strategies = weighted
                    .iter()
                    .filter(|(s, _, _)| s.is_some())
                    .map(|(_, _, kind)| *kind)
                    .collect();
                Candidate {
                    doc_id,
                    signals: scores,
                    smart_score,
                    strategies,
                }
            })
            .collect()
    }

    /// Steps 6-8: rank, truncate, classify.
    fn assemble(
        &self,
        q: &ProcessedQuery,
        mut candidates: Vec<Candidate>,
        documents: &HashMap<DocumentId, Document>,
        max_results: usize,
        nodes_found: usize,
        health: &SourceHealth,
    ) -> RankedContext {
        candidates.sort_by(|a, b| {
            b.smart_score
                .partial_cmp(&a.smart_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.strategies.len().cmp(&a.strategies.len()))
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        candidates.truncate(max_results);

        let to_match = |c: &Candidate| {
            let doc = documents.get(&c.doc_id);
            ScoredMatch {
                doc_id: c.doc_id.clone(),
                path: doc.map_or_else(|| c.doc_id.clone(), |d| d.path.clone()),
                summary: doc.and_then(|d| d.summary.clone()),
                score: c.smart_score,
                strategies: c.strategies.clone(),
            }
        };

        let primary_matches: Vec<ScoredMatch> = candidates
            .iter()
            .filter(|c| c.smart_score >= self.settings.primary_threshold)
            .map(to_match)
            .collect();
        let secondary_matches: Vec<ScoredMatch> = candidates
            .iter()
            .filter(|c| {
                c.smart_score >= self.settings.secondary_threshold
                    && c.smart_score < self.settings.primary_threshold
            })
            .map(to_match)
            .collect();

        RankedContext {
            intent: q.intent,
            nodes_found,
            source: if health.degraded() {
                ResponseSource::Degraded
            } else {
                ResponseSource::Search
            },
            primary_matches,
            secondary_matches,
            expanded_queries: q.expansions.clone(),
        }
    }
}
