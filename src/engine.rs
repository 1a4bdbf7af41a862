//! The chatbot service object.
//!
//! [`ChatEngine`] replaces process-wide mutable state with an explicit
//! service constructed once per process from injected dependencies:
//! an [`EmbeddingProvider`], a [`VectorIndex`], a [`LanguageModel`], and
//! (optionally) a [`SessionStore`] and [`Chunker`]. An external HTTP
//! gateway maps its endpoints onto the methods here; the engine itself
//! owns no transport.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::EngineConfig;
use crate::document::{Answer, Document, MetadataFilter, Turn};
use crate::embedding::EmbeddingProvider;
use crate::error::{FixragError, Result};
use crate::ifixit::IFixitClient;
use crate::index::VectorIndex;
use crate::llm::LanguageModel;
use crate::retriever::Retriever;
use crate::retry::with_backoff;
use crate::session::SessionStore;
use crate::synthesizer::AnswerSynthesizer;

/// Liveness snapshot reported to the gateway's health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    /// Chunks currently indexed.
    pub indexed_chunks: usize,
    /// Live conversation sessions.
    pub active_sessions: usize,
    /// Identifier of the generation model.
    pub model: String,
}

/// Outcome of ingesting one guide.
#[derive(Debug, Clone, Serialize)]
pub struct IngestedGuide {
    /// The guide identifier.
    pub guide_id: u64,
    /// The guide title.
    pub title: String,
    /// Chunks produced and indexed for the guide.
    pub chunk_count: usize,
}

/// The retrieval-augmented repair chatbot core.
///
/// Construct one via [`ChatEngine::builder`]; it lives for the process
/// and is shared behind an `Arc` by the gateway.
pub struct ChatEngine {
    config: EngineConfig,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    sessions: Arc<SessionStore>,
    guides: Option<IFixitClient>,
}

impl std::fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngine")
            .field("config", &self.config)
            .field("guides", &self.guides.is_some())
            .finish_non_exhaustive()
    }
}

impl ChatEngine {
    /// Create a new [`ChatEngineBuilder`].
    pub fn builder() -> ChatEngineBuilder {
        ChatEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Return a reference to the session store.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Ingest one document: supersede prior chunks, chunk, embed, upsert.
    ///
    /// Re-ingesting a document id replaces its chunks wholesale; nothing is
    /// mutated in place. Returns the number of chunks indexed. The
    /// retrieval cache is invalidated.
    pub async fn ingest_document(&self, document: &Document) -> Result<usize> {
        let mut chunks = self.chunker.chunk(document);

        self.index.delete_document(&document.id).await?;
        if chunks.is_empty() {
            self.retriever.invalidate_cache();
            info!(document.id = %document.id, chunk_count = 0, "ingested document (empty)");
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings =
            with_backoff("chunk embedding", self.config.max_retries, || {
                self.embedder.embed_batch(&texts)
            })
            .await?;

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
            chunk
                .metadata
                .insert("embedding_model".to_string(), self.embedder.model_id().to_string());
            if let Some(uri) = &document.source_uri {
                chunk.metadata.insert("source_uri".to_string(), uri.clone());
            }
        }

        self.index.upsert(&chunks).await?;
        self.retriever.invalidate_cache();

        info!(document.id = %document.id, chunk_count = chunks.len(), "ingested document");
        Ok(chunks.len())
    }

    /// Ingest multiple documents; returns the total chunk count.
    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<usize> {
        let mut total = 0;
        for document in documents {
            total += self.ingest_document(document).await?;
        }
        Ok(total)
    }

    /// Search iFixit for `device_query` and ingest up to `max_guides`
    /// matching guides.
    ///
    /// Guides that fail to fetch are skipped with a warning; the search
    /// itself failing is an error.
    pub async fn ingest_guides(
        &self,
        device_query: &str,
        max_guides: usize,
    ) -> Result<Vec<IngestedGuide>> {
        let client = self.guides.as_ref().ok_or_else(|| {
            FixragError::InvalidConfiguration("no guide client configured".to_string())
        })?;

        let hits = client.search_devices(device_query).await?;
        let mut ingested = Vec::new();
        for guide_id in hits.into_iter().filter_map(|hit| hit.guideid).take(max_guides) {
            let guide = match client.get_guide(guide_id).await {
                Ok(guide) => guide,
                Err(e) => {
                    warn!(guide_id, error = %e, "failed to fetch guide, skipping");
                    continue;
                }
            };
            let document = guide.to_document();
            let chunk_count = self.ingest_document(&document).await?;
            ingested.push(IngestedGuide { guide_id, title: guide.title, chunk_count });
        }

        info!(device_query, guide_count = ingested.len(), "knowledge base built");
        Ok(ingested)
    }

    /// Answer a question, optionally threading a session's history.
    ///
    /// `top_k` defaults to the configured value. With a `session_id`, the
    /// question and answer are appended to that session after synthesis
    /// succeeds; an unknown id fails with
    /// [`FixragError::SessionNotFound`] and leaves nothing appended.
    pub async fn answer(
        &self,
        question: &str,
        session_id: Option<&str>,
        top_k: Option<usize>,
    ) -> Result<Answer> {
        self.answer_filtered(question, session_id, top_k, None).await
    }

    /// [`answer`](ChatEngine::answer) restricted to chunks whose metadata
    /// satisfies `filter`.
    pub async fn answer_filtered(
        &self,
        question: &str,
        session_id: Option<&str>,
        top_k: Option<usize>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Answer> {
        let top_k = top_k.unwrap_or(self.config.top_k);
        let passages = self.retriever.retrieve(question, top_k, filter).await?;
        self.synthesizer.answer(question, session_id, passages).await
    }

    /// Answer a message within an existing session.
    pub async fn chat(&self, message: &str, session_id: &str) -> Result<Answer> {
        self.answer(message, Some(session_id), None).await
    }

    /// Create a session and return its generated identifier.
    pub async fn create_session(&self) -> String {
        self.sessions.create_session().await
    }

    /// Return a session's turns, most-recent-last.
    pub async fn history(&self, session_id: &str, max_turns: Option<usize>) -> Result<Vec<Turn>> {
        self.sessions.get_history(session_id, max_turns).await
    }

    /// Delete a session. Idempotent.
    pub async fn delete_session(&self, session_id: &str) {
        self.sessions.delete_session(session_id).await;
    }

    /// Report a liveness snapshot.
    pub async fn health(&self) -> Result<Health> {
        Ok(Health {
            indexed_chunks: self.index.count().await?,
            active_sessions: self.sessions.len().await,
            model: self.synthesizer.model_id().to_string(),
        })
    }

    /// Drop all indexed chunks and clear the retrieval cache.
    ///
    /// Sessions survive a reset.
    pub async fn reset(&self) -> Result<()> {
        self.index.clear().await?;
        self.retriever.invalidate_cache();
        info!("engine reset");
        Ok(())
    }
}

/// Builder for constructing a [`ChatEngine`].
///
/// The embedding provider, vector index, and language model are required;
/// the session store defaults to a fresh in-memory store, the chunker to a
/// [`FixedSizeChunker`] over the configured sizes, and the configuration to
/// [`EngineConfig::default`].
#[derive(Default)]
pub struct ChatEngineBuilder {
    config: Option<EngineConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
    model: Option<Arc<dyn LanguageModel>>,
    sessions: Option<Arc<SessionStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    guides: Option<IFixitClient>,
}

impl ChatEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector index backend.
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the language model.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the session store. Defaults to a fresh in-memory store.
    pub fn session_store(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Set the document chunker. Defaults to a [`FixedSizeChunker`] over
    /// the configured chunk size and overlap.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Attach an iFixit client for guide ingestion.
    pub fn guide_client(mut self, client: IFixitClient) -> Self {
        self.guides = Some(client);
        self
    }

    /// Build the [`ChatEngine`], validating configuration and required
    /// dependencies eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`FixragError::InvalidConfiguration`] if the configuration
    /// fails validation or a required dependency is missing.
    pub fn build(self) -> Result<ChatEngine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedder = self.embedder.ok_or_else(|| {
            FixragError::InvalidConfiguration("embedding provider is required".to_string())
        })?;
        let index = self.index.ok_or_else(|| {
            FixragError::InvalidConfiguration("vector index is required".to_string())
        })?;
        let model = self.model.ok_or_else(|| {
            FixragError::InvalidConfiguration("language model is required".to_string())
        })?;
        let sessions = self.sessions.unwrap_or_else(|| Arc::new(SessionStore::new()));
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::from_config(&config)?),
        };

        let retriever = Retriever::new(Arc::clone(&embedder), Arc::clone(&index), &config);
        let synthesizer = AnswerSynthesizer::new(model, Arc::clone(&sessions), &config);

        Ok(ChatEngine {
            config,
            chunker,
            embedder,
            index,
            retriever,
            synthesizer,
            sessions,
            guides: self.guides,
        })
    }
}
