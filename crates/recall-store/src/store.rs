//! The embedding store: upserts one record per (document, model) pair and
//! answers exact cosine similarity queries over a table scan. Linear scan
//! keeps the ranking contract exact; swap in an index structure only if the
//! same order is preserved.

use anyhow::{anyhow, Result};
use arrow_array::cast::AsArray;
use arrow_array::Array;
use arrow_array::{
    FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray,
    TimestampMillisecondArray,
};
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::ExecutableQuery;
use lancedb::Connection;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use recall_core::traits::EmbeddingProvider;
use recall_core::types::{Document, DocumentId, EmbeddingRecord};

use crate::schema::{build_documents_schema, build_embeddings_schema};
use crate::table::{ensure_table, open_db};

const EPS: f32 = 1e-6;

pub struct EmbeddingStore {
    conn: Connection,
    emb_table: String,
    docs_table: String,
    provider: Box<dyn EmbeddingProvider>,
}

impl EmbeddingStore {
    /// Open (or create) the store at `uri` with the given provider.
    pub async fn open(uri: &str, provider: Box<dyn EmbeddingProvider>) -> Result<Self> {
        let conn = open_db(uri).await?;
        let store = Self {
            conn,
            emb_table: "embeddings".to_string(),
            docs_table: "documents".to_string(),
            provider,
        };
        ensure_table(
            &store.conn,
            &store.emb_table,
            build_embeddings_schema(store.provider.dim() as i32),
        )
        .await?;
        ensure_table(&store.conn, &store.docs_table, build_documents_schema()).await?;
        Ok(store)
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    pub fn dim(&self) -> usize {
        self.provider.dim()
    }

    /// Embed a single text with the active provider. Deterministic for a
    /// given provider configuration; always `dim()` components.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.provider.embed_batch(&[text.to_string()])?;
        let v = batch
            .pop()
            .ok_or_else(|| anyhow!("provider returned no embedding"))?;
        anyhow::ensure!(
            v.len() == self.provider.dim(),
            "dim mismatch: got {} expected {}",
            v.len(),
            self.provider.dim()
        );
        Ok(v)
    }

    /// Upsert document metadata (path, current content hash, summary).
    pub async fn upsert_document(&self, doc: &Document) -> Result<()> {
        let schema = build_documents_schema();
        let rb = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![doc.id.clone()])),
                Arc::new(StringArray::from(vec![doc.path.clone()])),
                Arc::new(StringArray::from(vec![doc.content_hash.clone()])),
                Arc::new(StringArray::from(vec![doc.summary.clone()])),
                Arc::new(TimestampMillisecondArray::from(vec![
                    Utc::now().timestamp_millis(),
                ])),
            ],
        )?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema));
        let t = self.conn.open_table(&self.docs_table).execute().await?;
        let mut mi = t.merge_insert(&["doc_id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        Ok(())
    }

    /// Scan the documents metadata table.
    pub async fn documents(&self) -> Result<Vec<Document>> {
        let t = self.conn.open_table(&self.docs_table).execute().await?;
        let mut out = Vec::new();
        let mut stream = t.query().execute().await?;
        while let Some(batch) = stream.try_next().await? {
            let id_col = string_col(&batch, "doc_id")?;
            let path_col = string_col(&batch, "doc_path")?;
            let hash_col = string_col(&batch, "content_hash")?;
            let summary_col = string_col(&batch, "summary")?;
            for i in 0..batch.num_rows() {
                out.push(Document {
                    id: id_col.value(i).to_string(),
                    path: path_col.value(i).to_string(),
                    content_hash: hash_col.value(i).to_string(),
                    summary: if summary_col.is_null(i) {
                        None
                    } else {
                        Some(summary_col.value(i).to_string())
                    },
                });
            }
        }
        Ok(out)
    }

    /// Upsert the embedding record for (doc_id, active model). Overwrites
    /// any prior record for that pair; last write wins.
    pub async fn store(&self, doc_id: &str, vector: &[f32], content_hash: &str) -> Result<()> {
        let dim = self.provider.dim();
        anyhow::ensure!(
            vector.len() == dim,
            "dim mismatch: got {} expected {}",
            vector.len(),
            dim
        );
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        let now = Utc::now().timestamp_millis();

        let schema = build_embeddings_schema(dim as i32);
        let cells: Vec<Option<Vec<Option<f32>>>> =
            vec![Some(vector.iter().map(|&x| Some(x)).collect())];
        let rb = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![doc_id.to_string()])),
                Arc::new(StringArray::from(vec![self.provider.model_id().to_string()])),
                Arc::new(StringArray::from(vec![content_hash.to_string()])),
                Arc::new(Int32Array::from(vec![dim as i32])),
                Arc::new(Float32Array::from(vec![norm])),
                Arc::new(TimestampMillisecondArray::from(vec![now])),
                Arc::new(TimestampMillisecondArray::from(vec![now])),
                Arc::new(
                    FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
                        cells.into_iter(),
                        dim as i32,
                    ),
                ),
            ],
        )?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema));
        let t = self.conn.open_table(&self.emb_table).execute().await?;
        let mut mi = t.merge_insert(&["doc_id", "model_id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        debug!(doc_id, norm, "embedding stored");
        Ok(())
    }

    /// Ingestion pass-through: embed `text` and overwrite the record for
    /// `doc_id`, recording the content hash the vector was generated from.
    pub async fn regenerate_embedding(
        &self,
        doc_id: &str,
        text: &str,
        content_hash: &str,
    ) -> Result<()> {
        let vector = self.embed(text)?;
        self.store(doc_id, &vector, content_hash).await
    }

    /// Scan embedding records for the active model.
    pub async fn records(&self) -> Result<Vec<EmbeddingRecord>> {
        let t = self.conn.open_table(&self.emb_table).execute().await?;
        let mut out = Vec::new();
        let mut stream = t.query().execute().await?;
        while let Some(batch) = stream.try_next().await? {
            let id_col = string_col(&batch, "doc_id")?;
            let model_col = string_col(&batch, "model_id")?;
            let hash_col = string_col(&batch, "content_hash")?;
            let dim_col = batch
                .column_by_name("dim")
                .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
                .ok_or_else(|| anyhow!("missing dim column"))?;
            let norm_col = batch
                .column_by_name("norm")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| anyhow!("missing norm column"))?;
            let created_col = timestamp_col(&batch, "created_at")?;
            let updated_col = timestamp_col(&batch, "updated_at")?;
            let vec_col = batch
                .column_by_name("vector")
                .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
                .ok_or_else(|| anyhow!("missing vector column"))?;
            for i in 0..batch.num_rows() {
                if model_col.value(i) != self.provider.model_id() {
                    continue;
                }
                let list = vec_col.value(i);
                let vector = list
                    .as_primitive::<arrow_array::types::Float32Type>()
                    .values()
                    .iter()
                    .copied()
                    .collect::<Vec<f32>>();
                out.push(EmbeddingRecord {
                    doc_id: id_col.value(i).to_string(),
                    model_id: model_col.value(i).to_string(),
                    dim: dim_col.value(i) as usize,
                    vector,
                    norm: norm_col.value(i),
                    content_hash: hash_col.value(i).to_string(),
                    created_at: created_col.value(i),
                    updated_at: updated_col.value(i),
                });
            }
        }
        Ok(out)
    }

    /// Exact cosine similarity search against all stored vectors for the
    /// active model. Scores are in [-1, 1]; results below `min_similarity`
    /// are excluded; ties break by doc_id ascending. A zero query vector is
    /// rejected with an empty result rather than an error.
    pub async fn similarity_search(
        &self,
        query_vec: &[f32],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<(DocumentId, f32)>> {
        let q_norm = query_vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if q_norm <= EPS {
            debug!("zero query vector, returning empty result");
            return Ok(Vec::new());
        }

        // Current content hashes; a mismatched record is stale and is kept
        // out of scoring until regenerated.
        let current: HashMap<DocumentId, String> = self
            .documents()
            .await?
            .into_iter()
            .map(|d| (d.id, d.content_hash))
            .collect();

        let mut hits: Vec<(DocumentId, f32)> = Vec::new();
        for rec in self.records().await? {
            if rec.norm <= EPS {
                continue;
            }
            if let Some(hash) = current.get(&rec.doc_id) {
                if *hash != rec.content_hash {
                    warn!(doc_id = %rec.doc_id, "stale embedding excluded from scoring");
                    continue;
                }
            }
            if rec.vector.len() != query_vec.len() {
                continue;
            }
            let dot: f32 = rec
                .vector
                .iter()
                .zip(query_vec.iter())
                .map(|(a, b)| a * b)
                .sum();
            let score = dot / (rec.norm * q_norm);
            if score >= min_similarity {
                hits.push((rec.doc_id, score));
            }
        }

        hits.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("missing {} column", name))
}

fn timestamp_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a TimestampMillisecondArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<TimestampMillisecondArray>())
        .ok_or_else(|| anyhow!("missing {} column", name))
}
