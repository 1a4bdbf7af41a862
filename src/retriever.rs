//! Query-time retrieval: embed → index query → ranked passages.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{QueryCache, QueryKey, normalize_query};
use crate::config::EngineConfig;
use crate::document::{MetadataFilter, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{FixragError, Result};
use crate::index::VectorIndex;
use crate::retry::{with_backoff, with_timeout};

/// Retrieves the top-k passages for a question.
///
/// Read-only against the index. Unfiltered queries are served from a
/// bounded LRU cache keyed by normalized query text and `top_k`; the
/// ingest path calls [`invalidate_cache`](Retriever::invalidate_cache)
/// whenever the index changes. Transient provider failures retry with
/// bounded exponential backoff; the whole call is bounded by the
/// configured request timeout.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    cache: QueryCache,
    timeout: Duration,
    max_retries: u32,
}

impl Retriever {
    /// Create a retriever over the given provider and index.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            cache: QueryCache::new(config.cache_capacity),
            timeout: config.request_timeout,
            max_retries: config.max_retries,
        }
    }

    /// Return up to `top_k` passages ranked by descending similarity.
    ///
    /// Ties are broken by ascending chunk ID. Fewer indexed chunks than
    /// `top_k` yield fewer results; an empty index yields an empty `Vec`,
    /// not an error.
    ///
    /// # Errors
    ///
    /// - [`FixragError::InvalidConfiguration`] when `top_k` is zero,
    ///   rejected before any external call.
    /// - [`FixragError::EmbeddingUnavailable`] /
    ///   [`FixragError::RateLimited`] /
    ///   [`FixragError::InvalidEmbeddingInput`] from the provider.
    /// - [`FixragError::Timeout`] when the configured timeout expires.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>> {
        if top_k == 0 {
            return Err(FixragError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }

        // Filtered queries bypass the cache: the key covers query + top_k only.
        let cache_key = filter
            .is_none()
            .then(|| QueryKey { query: normalize_query(query), top_k });
        if let Some(key) = &cache_key {
            if let Some(hit) = self.cache.get(key) {
                debug!(query, top_k, "retrieval cache hit");
                return Ok(hit);
            }
        }

        let embedding = with_timeout(
            self.timeout,
            "query embedding",
            with_backoff("query embedding", self.max_retries, || self.embedder.embed(query)),
        )
        .await?;

        let results = with_timeout(
            self.timeout,
            "index query",
            with_backoff("index query", self.max_retries, || {
                self.index.query(&embedding, top_k, filter)
            }),
        )
        .await?;

        if let Some(key) = cache_key {
            self.cache.put(key, results.clone());
        }

        info!(query, top_k, result_count = results.len(), "retrieval completed");
        Ok(results)
    }

    /// Drop every cached retrieval result.
    ///
    /// Must be called whenever the index contents change.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
        debug!("retrieval cache invalidated");
    }

    /// Number of chunks currently indexed.
    pub async fn indexed_chunks(&self) -> Result<usize> {
        self.index.count().await
    }
}
