//! Graph accessor adapter. The relationship graph is an external system;
//! this crate consumes its triples and answers term lookups with direct
//! and transitively related documents. `MemoryGraph` is the in-process
//! backend; anything network-facing implements the same trait.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use recall_core::traits::GraphAccessor;
use recall_core::types::{DocumentId, GraphEdge, GraphHit};

/// Relevance decay per traversal hop.
const HOP_DECAY: f32 = 0.5;
/// Transitive traversal depth beyond the seed nodes.
const MAX_HOPS: usize = 2;

/// Adjacency index over relationship triples, held in memory.
#[derive(Default)]
pub struct MemoryGraph {
    /// Undirected adjacency: related documents per node.
    neighbors: HashMap<DocumentId, Vec<DocumentId>>,
}

impl MemoryGraph {
    pub fn new(edges: &[GraphEdge]) -> Self {
        let mut neighbors: HashMap<DocumentId, Vec<DocumentId>> = HashMap::new();
        for e in edges {
            neighbors
                .entry(e.source.clone())
                .or_default()
                .push(e.target.clone());
            neighbors
                .entry(e.target.clone())
                .or_default()
                .push(e.source.clone());
        }
        Self { neighbors }
    }

    /// Load a JSON triples file: `[{"source", "relationship", "target"}, ...]`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("cannot read graph file {}: {}", path.display(), e))?;
        let edges: Vec<GraphEdge> = serde_json::from_str(&raw)?;
        debug!(edges = edges.len(), file = %path.display(), "graph loaded");
        Ok(Self::new(&edges))
    }

    /// Nodes whose identifier contains the term (case-insensitive).
    fn seeds(&self, term: &str) -> Vec<&DocumentId> {
        let term = term.to_lowercase();
        self.neighbors
            .keys()
            .filter(|id| id.to_lowercase().contains(&term))
            .collect()
    }
}

#[async_trait]
impl GraphAccessor for MemoryGraph {
    async fn related(&self, terms: &[String]) -> Result<Vec<GraphHit>> {
        // Best relevance per document across all terms and hops.
        let mut best: HashMap<DocumentId, f32> = HashMap::new();
        for term in terms {
            let mut frontier: Vec<DocumentId> =
                self.seeds(term).into_iter().cloned().collect();
            let mut relevance = 1.0f32;
            for node in &frontier {
                best.entry(node.clone())
                    .and_modify(|r| *r = r.max(relevance))
                    .or_insert(relevance);
            }
            for _ in 0..MAX_HOPS {
                relevance *= HOP_DECAY;
                let mut next = Vec::new();
                for node in &frontier {
                    for neighbor in self.neighbors.get(node).into_iter().flatten() {
                        let entry = best.entry(neighbor.clone()).or_insert(0.0);
                        if relevance > *entry {
                            *entry = relevance;
                            next.push(neighbor.clone());
                        }
                    }
                }
                if next.is_empty() {
                    break;
                }
                frontier = next;
            }
        }
        let mut hits: Vec<GraphHit> = best
            .into_iter()
            .map(|(doc_id, relevance)| GraphHit { doc_id, relevance })
            .collect();
        hits.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        Ok(hits)
    }

    async fn contains(&self, term: &str) -> Result<bool> {
        Ok(!self.seeds(term).is_empty())
    }
}

/// Adapter used when no graph backend is configured. Every call fails, so
/// the engine degrades to its remaining signal sources.
pub struct DisconnectedGraph;

#[async_trait]
impl GraphAccessor for DisconnectedGraph {
    async fn related(&self, _terms: &[String]) -> Result<Vec<GraphHit>> {
        Err(anyhow!("graph backend not configured"))
    }

    async fn contains(&self, _term: &str) -> Result<bool> {
        Err(anyhow!("graph backend not configured"))
    }
}
