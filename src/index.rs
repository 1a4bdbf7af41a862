//! Vector index trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, MetadataFilter, RetrievalResult};
use crate::error::Result;

/// A storage backend for chunk embeddings with similarity search.
///
/// The index is an external capability: the pipeline only invokes it. The
/// query path is read-only; writes happen on the ingest path, which also
/// invalidates the retrieval cache.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace chunks by their IDs. Chunks must have embeddings set.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()>;

    /// Return the `top_k` chunks most similar to `embedding`, restricted to
    /// chunks whose metadata satisfies `filter` when given.
    ///
    /// Results are ordered by descending similarity with ties broken by
    /// ascending chunk ID, and carry 1-based ranks. Fewer than `top_k`
    /// indexed chunks yield fewer results; an empty index yields an empty
    /// `Vec`, not an error.
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>>;

    /// Delete chunks by their IDs. Unknown IDs are ignored.
    async fn delete(&self, ids: &[&str]) -> Result<()>;

    /// Delete every chunk belonging to the given document.
    ///
    /// This is the supersede path for re-ingesting a document.
    async fn delete_document(&self, document_id: &str) -> Result<()>;

    /// Number of chunks currently indexed.
    async fn count(&self) -> Result<usize>;

    /// Remove all indexed chunks.
    async fn clear(&self) -> Result<()>;
}
