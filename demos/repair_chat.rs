//! # Repair Chat Demo
//!
//! Runs the full ingest-and-answer flow with in-memory components and a
//! deterministic mock embedder plus a canned language model, so it needs
//! **zero API keys and no running daemon**.
//!
//! Run: `cargo run --example repair_chat`

use std::sync::Arc;

use async_trait::async_trait;
use fixrag::{
    ChatEngine, Document, EmbeddingProvider, EngineConfig, GenerateOptions, InMemoryIndex,
    LanguageModel,
};

// ---------------------------------------------------------------------------
// MockEmbedder — deterministic hash-based embeddings for demos/tests
// ---------------------------------------------------------------------------

struct MockEmbedder {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> fixrag::Result<Vec<f32>> {
        // Deterministic embedding: hash the text bytes, then generate a
        // normalised vector whose direction depends on the content.
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        "mock-embedder"
    }
}

// ---------------------------------------------------------------------------
// MockModel — cites the first passage it is given
// ---------------------------------------------------------------------------

struct MockModel;

#[async_trait]
impl LanguageModel for MockModel {
    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> fixrag::Result<String> {
        if prompt.contains("[S1]") {
            Ok("Work through the steps in the cited guide, starting with powering the device down.\nSources: [S1]".to_string())
        } else {
            Ok("No matching guides are indexed for that question; try ingesting one first.".to_string())
        }
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("fixrag=info").init();

    // Hash embeddings have no semantic geometry, so accept any similarity.
    let config = EngineConfig::builder()
        .chunk_size(200)
        .chunk_overlap(40)
        .top_k(2)
        .similarity_threshold(-1.0)
        .build()?;

    let engine = ChatEngine::builder()
        .config(config)
        .embedding_provider(Arc::new(MockEmbedder { dimensions: 64 }))
        .vector_index(Arc::new(InMemoryIndex::new()))
        .language_model(Arc::new(MockModel))
        .build()?;

    let guides = vec![
        Document::new(
            "phone-battery",
            "Title: Phone Battery Replacement\nDevice: Phone\n\nRepair Steps:\n\
             Step 1: Remove the back cover.\nStep 2: Unscrew the four screws.\n\
             Step 3: Lift the battery.",
        )
        .with_metadata("device", "Phone"),
        Document::new(
            "laptop-fan",
            "Title: Laptop Fan Cleaning\nDevice: Laptop\n\nRepair Steps:\n\
             Step 1: Unplug the power.\nStep 2: Open the bottom panel.\n\
             Step 3: Blow out the dust.",
        )
        .with_metadata("device", "Laptop"),
    ];

    println!("Ingesting {} guides...", guides.len());
    for guide in &guides {
        let chunks = engine.ingest_document(guide).await?;
        println!("  {} → {} chunk(s)", guide.id, chunks);
    }

    let session = engine.create_session().await;
    let questions = ["How do I remove the battery?", "And how do I clean the fan?"];

    for question in &questions {
        println!("\nYou: {question}");
        let answer = engine.chat(question, &session).await?;
        println!("Bot: {}", answer.text);
        for citation in &answer.citations {
            println!("  [source: {}]", citation.document_id);
        }
    }

    let history = engine.history(&session, None).await?;
    println!("\nSession has {} turns.", history.len());

    let health = engine.health().await?;
    println!("Health: {} chunks indexed, {} session(s).", health.indexed_chunks, health.active_sessions);

    Ok(())
}
