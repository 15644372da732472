use async_trait::async_trait;
use std::time::Duration;

use crate::types::GraphHit;

/// Text-to-vector conversion. Implementations must be deterministic for a
/// given configuration and always return vectors of `dim()` components.
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `local:bge-m3:d1024`).
    /// Fallback providers carry a distinct prefix so their vectors can be
    /// detected and re-embedded later.
    fn model_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Maximum token length for this provider.
    fn max_len(&self) -> usize;
    /// Compute embeddings for a batch of input texts.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Read access to the relationship graph. The graph itself is an external
/// system; the engine only issues queries and consumes results.
#[async_trait]
pub trait GraphAccessor: Send + Sync {
    /// Resolve query terms against the graph, returning directly and
    /// transitively related documents with relevance in [0, 1].
    async fn related(&self, terms: &[String]) -> anyhow::Result<Vec<GraphHit>>;

    /// Whether any document matching the term exists in the graph.
    async fn contains(&self, term: &str) -> anyhow::Result<bool>;
}

#[async_trait]
impl<T> GraphAccessor for Box<T>
where
    T: GraphAccessor + ?Sized,
{
    async fn related(&self, terms: &[String]) -> anyhow::Result<Vec<GraphHit>> {
        (**self).related(terms).await
    }

    async fn contains(&self, term: &str) -> anyhow::Result<bool> {
        (**self).contains(term).await
    }
}

/// Key/value cache for ranked results. Keys are normalized query strings;
/// values are opaque serialized payloads. Any error here is recoverable:
/// the engine treats it as a miss and runs the full search.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> anyhow::Result<()>;
    async fn invalidate(&self, key: &str) -> anyhow::Result<()>;
}
