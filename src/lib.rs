//! # fixrag
//!
//! Retrieval-augmented repair guidance: the query-and-retrieval core of a
//! chatbot that answers repair questions from ingested documentation.
//!
//! ## Overview
//!
//! The pipeline maps a natural-language question plus conversation state to
//! a ranked set of context passages and a synthesized answer with source
//! attribution:
//!
//! 1. **Ingest**: repair documentation (local text files or guides fetched
//!    from the iFixit API) is normalized into [`Document`]s, split into
//!    overlapping character windows by a [`Chunker`], embedded by an
//!    [`EmbeddingProvider`], and upserted into a [`VectorIndex`].
//! 2. **Retrieve**: the [`Retriever`] embeds a question and returns the
//!    top-k nearest chunks, cached and deterministic.
//! 3. **Synthesize**: the [`AnswerSynthesizer`] composes a prompt from
//!    tagged passages and bounded session history, invokes a
//!    [`LanguageModel`], and attributes citations back to the retrieved set.
//!
//! The [`ChatEngine`] ties these together as one service object with
//! injected dependencies; an external HTTP gateway maps endpoints onto its
//! methods. Embedding, vector storage, and generation are external
//! capabilities invoked behind traits; this crate owns none of them.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fixrag::{ChatEngine, EngineConfig, InMemoryIndex, OllamaEmbedder, OllamaGenerator};
//!
//! let engine = ChatEngine::builder()
//!     .config(EngineConfig::default())
//!     .embedding_provider(Arc::new(OllamaEmbedder::new()))
//!     .vector_index(Arc::new(InMemoryIndex::new()))
//!     .language_model(Arc::new(OllamaGenerator::new()))
//!     .build()?;
//!
//! engine.ingest_guides("iPhone 13", 3).await?;
//! let session = engine.create_session().await;
//! let answer = engine.chat("How do I remove the battery?", &session).await?;
//! println!("{} ({} sources)", answer.text, answer.citations.len());
//! ```

mod cache;
mod retry;

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod ifixit;
pub mod index;
pub mod inmemory;
pub mod llm;
pub mod ollama;
pub mod retriever;
pub mod session;
pub mod synthesizer;

pub use chunking::{ChunkWindows, Chunker, FixedSizeChunker};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use document::{
    Answer, Chunk, Citation, Document, MetadataFilter, RetrievalResult, Role, Turn,
    load_text_documents,
};
pub use embedding::EmbeddingProvider;
pub use engine::{ChatEngine, ChatEngineBuilder, Health, IngestedGuide};
pub use error::{FixragError, Result};
pub use ifixit::{Guide, IFixitClient, SearchHit};
pub use index::VectorIndex;
pub use inmemory::InMemoryIndex;
pub use llm::{GenerateOptions, LanguageModel};
pub use ollama::{OllamaEmbedder, OllamaGenerator};
pub use retriever::Retriever;
pub use session::SessionStore;
pub use synthesizer::AnswerSynthesizer;
