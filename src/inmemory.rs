//! In-memory vector index using cosine similarity.
//!
//! [`InMemoryIndex`] is a zero-dependency reference backend backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. Suitable for
//! development, testing, and small corpora; persistence-backed indexes
//! plug in behind the same [`VectorIndex`] trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, MetadataFilter, RetrievalResult};
use crate::error::Result;
use crate::index::VectorIndex;

/// An in-memory [`VectorIndex`] using cosine similarity for search.
///
/// Cosine similarity is the only distance metric this backend implements;
/// scores lie in `[-1.0, 1.0]`. Equal scores are ordered by ascending
/// chunk ID for determinism.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    chunks: RwLock<HashMap<String, Chunk>>,
}

impl InMemoryIndex {
    /// Create a new empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        let mut store = self.chunks.write().await;
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>> {
        let store = self.chunks.read().await;

        let mut scored: Vec<(f32, &Chunk)> = store
            .values()
            .filter(|chunk| filter.is_none_or(|f| f.matches(&chunk.metadata)))
            .map(|chunk| (cosine_similarity(&chunk.embedding, embedding), chunk))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(i, (score, chunk))| RetrievalResult { chunk: chunk.clone(), score, rank: i + 1 })
            .collect())
    }

    async fn delete(&self, ids: &[&str]) -> Result<()> {
        let mut store = self.chunks.write().await;
        for id in ids {
            store.remove(*id);
        }
        Ok(())
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let mut store = self.chunks.write().await;
        store.retain(|_, chunk| chunk.document_id != document_id);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.chunks.read().await.len())
    }

    async fn clear(&self) -> Result<()> {
        self.chunks.write().await.clear();
        Ok(())
    }
}
