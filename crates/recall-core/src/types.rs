//! Domain types shared by the store, graph, cache, and engine crates.

use serde::{Deserialize, Serialize};

pub type DocumentId = String;

/// An indexed unit of content. Owned by the ingestion side; the engine
/// reads it and maintains embedding metadata for it.
///
/// - `id`: stable, opaque document identifier
/// - `path`: source path or label
/// - `content_hash`: blake3 hash of the current content, used for change
///   detection against stored embeddings
/// - `summary`: optional precomputed one-line summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub path: String,
    pub content_hash: String,
    pub summary: Option<String>,
}

/// A persisted embedding for one (document, model) pair.
///
/// The record is trusted only while `content_hash` matches the document's
/// current hash; otherwise it is stale and excluded from scoring until
/// regenerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub doc_id: DocumentId,
    pub model_id: String,
    pub dim: usize,
    pub vector: Vec<f32>,
    pub norm: f32,
    pub content_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Coarse classification of what kind of help a query is seeking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Debugging,
    Implementation,
    Testing,
    Explanation,
    Optimization,
    Security,
    General,
}

/// Indicates which retrieval signal produced (or contributed to) a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Vector,
    Graph,
    Fuzzy,
}

/// Raw per-source scores for a candidate, each normalized into [0, 1].
/// `None` means the source did not surface the document at all.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SignalScores {
    pub vector: Option<f32>,
    pub graph: Option<f32>,
    pub fuzzy: Option<f32>,
}

impl SignalScores {
    /// The strongest single signal, or 0.0 when no source fired.
    pub fn best(&self) -> f32 {
        [self.vector, self.graph, self.fuzzy]
            .into_iter()
            .flatten()
            .fold(0.0f32, f32::max)
    }

    /// Number of independent signals that surfaced the document.
    pub fn strategy_count(&self) -> usize {
        [self.vector, self.graph, self.fuzzy]
            .iter()
            .filter(|s| s.is_some())
            .count()
    }
}

/// A scored match produced during retrieval. One per document: a document
/// found via several strategies gets one candidate with a richer score,
/// never multiple entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub doc_id: DocumentId,
    pub signals: SignalScores,
    pub smart_score: f32,
    pub strategies: Vec<SignalKind>,
}

/// Where a ranked context came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Search,
    Degraded,
}

/// A presentation-level match inside a ranked context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub doc_id: DocumentId,
    pub path: String,
    pub summary: Option<String>,
    pub score: f32,
    pub strategies: Vec<SignalKind>,
}

/// The single ranked answer returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedContext {
    pub intent: Intent,
    pub nodes_found: usize,
    pub source: ResponseSource,
    pub primary_matches: Vec<ScoredMatch>,
    pub secondary_matches: Vec<ScoredMatch>,
    pub expanded_queries: Vec<String>,
}

/// A relationship triple as returned by the graph system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: DocumentId,
    pub relationship: String,
    pub target: DocumentId,
}

/// A graph lookup result: a related document with a relevance in [0, 1]
/// (direct hits score higher than transitive ones).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphHit {
    pub doc_id: DocumentId,
    pub relevance: f32,
}
