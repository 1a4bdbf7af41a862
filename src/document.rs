//! Data types for documents, chunks, retrieval results, and conversation turns.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FixragError, Result};

/// A normalized source document: raw text plus descriptive metadata.
///
/// Documents are immutable once ingested. Re-ingesting a document with the
/// same `id` supersedes its chunks in the index; it never mutates them in
/// place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata (for repair guides: `device`, `guide_type`, ...).
    pub metadata: HashMap<String, String>,
    /// Optional URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with empty metadata and no source URI.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new(), source_uri: None }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach a source URI.
    pub fn with_source_uri(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }
}

/// A window of a parent [`Document`], with character offsets and its vector
/// embedding.
///
/// Chunk IDs are generated as `{document_id}#{index}`. Dropping the first
/// `overlap` characters of every chunk after the first and concatenating
/// the rest reconstructs the parent text exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Zero-based position of this chunk within the parent document.
    pub index: usize,
    /// The text window.
    pub text: String,
    /// Character offset of the window start in the parent text.
    pub start: usize,
    /// Character offset one past the window end in the parent text.
    pub end: usize,
    /// Number of leading characters shared with the preceding chunk.
    pub overlap: usize,
    /// The vector embedding for this chunk's text. Empty until embedded.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus chunk-specific fields
    /// (`chunk_index`, and after ingest `embedding_model` and `source_uri`).
    pub metadata: HashMap<String, String>,
}

/// A retrieved [`Chunk`] paired with its similarity score and rank.
///
/// Ephemeral: produced per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
    /// 1-based rank by descending score.
    pub rank: usize,
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user asking questions.
    User,
    /// The assistant answering them.
    Assistant,
}

/// One message in a conversation session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// Who produced the turn.
    pub role: Role,
    /// The message text.
    pub text: String,
    /// When the turn was appended.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self { role, text: text.into(), timestamp: Utc::now() }
    }
}

/// An equality predicate over chunk metadata.
///
/// A chunk matches when every listed key is present with the listed value.
/// An empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataFilter {
    /// Required key-value pairs.
    pub equals: HashMap<String, String>,
}

impl MetadataFilter {
    /// A filter requiring `key == value`.
    pub fn field_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { equals: HashMap::from([(key.into(), value.into())]) }
    }

    /// Add a further required key-value pair.
    pub fn and(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    /// Whether the given metadata satisfies the predicate.
    pub fn matches(&self, metadata: &HashMap<String, String>) -> bool {
        self.equals.iter().all(|(key, value)| metadata.get(key) == Some(value))
    }
}

/// A source reference attached to an [`Answer`].
///
/// Every citation references a chunk that was actually retrieved for the
/// call that produced the answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// The cited chunk.
    pub chunk_id: String,
    /// The chunk's parent document.
    pub document_id: String,
    /// The parent document's source URI, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

/// A synthesized answer with source attribution.
///
/// Ephemeral per query; when a session is bound, the answer text is also
/// appended to the session as an assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The answer text, with the model's source-tag line stripped.
    pub text: String,
    /// Cited passages, in the order the model referenced them.
    pub citations: Vec<Citation>,
    /// Identifier of the model that produced the answer.
    pub model_id: String,
    /// False when no passage cleared the similarity threshold and the answer
    /// was produced without retrieved context (the "no sources found" marker).
    pub context_found: bool,
    /// Time spent composing the prompt and generating.
    pub latency: Duration,
}

/// Load plain-text documents (`.txt`, `.md`) from a directory.
///
/// Each file becomes one [`Document`] with the file stem as its id and the
/// file path as its source URI. Results are sorted by id for determinism.
pub async fn load_text_documents(dir: impl AsRef<Path>) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| FixragError::GuideSource(format!("failed to read '{}': {e}", dir.display())))?;

    let mut documents = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| FixragError::GuideSource(format!("failed to read '{}': {e}", dir.display())))?
    {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if ext != "txt" && ext != "md" {
            continue;
        }
        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            FixragError::GuideSource(format!("failed to read '{}': {e}", path.display()))
        })?;
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        documents.push(Document {
            id,
            text,
            metadata: HashMap::new(),
            source_uri: Some(path.display().to_string()),
        });
    }

    documents.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(documents)
}
