//! Shared test doubles: deterministic embedder and canned language models.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fixrag::{
    Chunk, EmbeddingProvider, FixragError, GenerateOptions, LanguageModel, Result,
};

/// Deterministic hash-based embedder; no API keys, reproducible vectors.
pub struct HashEmbedder {
    dimensions: usize,
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hash = text
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut embedding = vec![0.0f32; self.dimensions];
        for (i, v) in embedding.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        "hash-embedder"
    }
}

/// An embedder whose provider is always unreachable.
pub struct UnreachableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnreachableEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(FixragError::EmbeddingUnavailable {
            provider: "test".to_string(),
            message: "connection refused".to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn model_id(&self) -> &str {
        "unreachable"
    }
}

/// A language model returning a fixed response, recording every prompt.
pub struct CannedModel {
    response: String,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedModel {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into(), prompts: Mutex::new(Vec::new()) }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for CannedModel {
    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }

    fn model_id(&self) -> &str {
        "canned"
    }
}

/// A language model that always fails.
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String> {
        Err(FixragError::GenerationFailed {
            model: "failing".to_string(),
            message: "boom".to_string(),
        })
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

/// Build a chunk with an explicit embedding for direct index tests.
pub fn chunk_with_embedding(id: &str, text: &str, embedding: Vec<f32>) -> Chunk {
    let document_id = id.split('#').next().unwrap_or(id).to_string();
    Chunk {
        id: id.to_string(),
        document_id,
        index: 0,
        text: text.to_string(),
        start: 0,
        end: text.chars().count(),
        overlap: 0,
        embedding,
        metadata: HashMap::new(),
    }
}

/// Same as [`chunk_with_embedding`] with metadata entries attached.
pub fn chunk_with_metadata(
    id: &str,
    text: &str,
    embedding: Vec<f32>,
    metadata: &[(&str, &str)],
) -> Chunk {
    let mut chunk = chunk_with_embedding(id, text, embedding);
    for (key, value) in metadata {
        chunk.metadata.insert((*key).to_string(), (*value).to_string());
    }
    chunk
}
