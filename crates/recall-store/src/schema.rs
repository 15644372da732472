use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

/// Embeddings table: one row per (doc_id, model_id). The vector column is
/// sized by the active provider's dimensionality.
pub fn build_embeddings_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("doc_id", DataType::Utf8, false),
        Field::new("model_id", DataType::Utf8, false),
        Field::new("content_hash", DataType::Utf8, false),
        Field::new("dim", DataType::Int32, false),
        Field::new("norm", DataType::Float32, false),
        Field::new(
            "created_at",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
        Field::new(
            "updated_at",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}

/// Documents metadata table: the content hash recorded here is the
/// freshness reference for stored embeddings.
pub fn build_documents_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("doc_id", DataType::Utf8, false),
        Field::new("doc_path", DataType::Utf8, false),
        Field::new("content_hash", DataType::Utf8, false),
        Field::new("summary", DataType::Utf8, true),
        Field::new(
            "updated_at",
            DataType::Timestamp(TimeUnit::Millisecond, None),
            false,
        ),
    ]))
}
