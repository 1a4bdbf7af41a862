//! Document chunking.
//!
//! [`FixedSizeChunker`] splits documents into character-addressed windows
//! with configurable overlap. Windows are produced lazily by
//! [`ChunkWindows`]; call [`FixedSizeChunker::windows`] again for a fresh
//! pass over the same document.

use crate::config::EngineConfig;
use crate::document::{Chunk, Document};
use crate::error::{FixragError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text, offsets, and metadata but
/// no embeddings. Embeddings are attached later by the ingest path.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into fixed-size character windows with configurable overlap.
///
/// Windows cover the document end-to-end with no gaps; consecutive windows
/// share exactly `chunk_overlap` characters. A document shorter than
/// `chunk_size` yields a single chunk equal to the whole text. Offsets are
/// character offsets, so multi-byte text is never split mid-character.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`FixragError::InvalidConfiguration`] if `chunk_size` is zero
    /// or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(FixragError::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(FixragError::InvalidConfiguration(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Create a chunker from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Lazily iterate over the document's chunk windows.
    ///
    /// The iterator is finite and restartable: each call starts a fresh
    /// pass from the beginning of the document.
    pub fn windows<'a>(&self, document: &'a Document) -> ChunkWindows<'a> {
        ChunkWindows {
            document,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            byte_start: 0,
            char_start: 0,
            index: 0,
            done: document.text.is_empty(),
        }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.windows(document).collect()
    }
}

/// Lazy iterator over a document's chunk windows.
///
/// Produced by [`FixedSizeChunker::windows`].
#[derive(Debug)]
pub struct ChunkWindows<'a> {
    document: &'a Document,
    chunk_size: usize,
    chunk_overlap: usize,
    byte_start: usize,
    char_start: usize,
    index: usize,
    done: bool,
}

impl Iterator for ChunkWindows<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }

        let text = &self.document.text;
        let rest = &text[self.byte_start..];

        // Window end: chunk_size characters or the end of the text.
        let (window, window_chars) = match rest.char_indices().nth(self.chunk_size) {
            Some((offset, _)) => (&rest[..offset], self.chunk_size),
            None => (rest, rest.chars().count()),
        };

        let overlap = if self.index == 0 { 0 } else { self.chunk_overlap };
        let mut metadata = self.document.metadata.clone();
        metadata.insert("chunk_index".to_string(), self.index.to_string());

        let chunk = Chunk {
            id: format!("{}#{}", self.document.id, self.index),
            document_id: self.document.id.clone(),
            index: self.index,
            text: window.to_string(),
            start: self.char_start,
            end: self.char_start + window_chars,
            overlap,
            embedding: Vec::new(),
            metadata,
        };

        if self.byte_start + window.len() >= text.len() {
            // This window reached the end of the document.
            self.done = true;
        } else {
            let step = self.chunk_size - self.chunk_overlap;
            match rest.char_indices().nth(step) {
                Some((offset, _)) => {
                    self.byte_start += offset;
                    self.char_start += step;
                }
                None => self.done = true,
            }
        }
        self.index += 1;

        Some(chunk)
    }
}
