//! Embedding persistence and exact cosine similarity search over LanceDB.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod schema;
pub mod store;
pub mod table;

pub use store::EmbeddingStore;

/// Blake3 content hash, hex-encoded. The change-detection key for both
/// documents and their embeddings.
pub fn hash_content(s: &str) -> String {
    blake3::hash(s.as_bytes()).to_hex().to_string()
}
