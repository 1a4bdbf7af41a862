//! Ollama providers over the local HTTP API.
//!
//! [`OllamaEmbedder`] implements [`EmbeddingProvider`] against
//! `/api/embeddings`, and [`OllamaGenerator`] implements [`LanguageModel`]
//! against `/api/generate` (non-streaming). Both default to the standard
//! local daemon at `http://localhost:11434`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{FixragError, Result};
use crate::llm::{GenerateOptions, LanguageModel};

/// The default Ollama daemon address.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default embedding model.
const DEFAULT_EMBED_MODEL: &str = "all-minilm";

/// The dimensionality of `all-minilm` embeddings.
const DEFAULT_EMBED_DIMENSIONS: usize = 384;

/// The default generation model.
const DEFAULT_GENERATE_MODEL: &str = "llama3.1";

/// An [`EmbeddingProvider`] backed by a local Ollama daemon.
///
/// # Example
///
/// ```rust,ignore
/// use fixrag::OllamaEmbedder;
///
/// let embedder = OllamaEmbedder::new().with_model("nomic-embed-text", 768);
/// let embedding = embedder.embed("hello world").await?;
/// ```
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create a provider against the default daemon address and model.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_EMBED_MODEL.to_string(),
            dimensions: DEFAULT_EMBED_DIMENSIONS,
        }
    }

    /// Point the provider at a different daemon address.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the embedding model and its output dimensionality.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }
}

impl Default for OllamaEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateRequestOptions<'a>,
}

fn slice_is_empty(slice: &[String]) -> bool {
    slice.is_empty()
}

#[derive(Serialize)]
struct GenerateRequestOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "slice_is_empty")]
    stop: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Ollama", model = %self.model, text_len = text.len(), "embedding text");

        let request_body = EmbeddingsRequest { model: &self.model, prompt: text };
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Ollama", error = %e, "embedding request failed");
                FixragError::EmbeddingUnavailable {
                    provider: "Ollama".to_string(),
                    message: format!("request failed: {e}"),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(provider = "Ollama", %status, "embedding API error");
            return Err(if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                FixragError::RateLimited {
                    provider: "Ollama".to_string(),
                    message: format!("API returned {status}: {body}"),
                }
            } else if status.is_client_error() {
                FixragError::InvalidEmbeddingInput {
                    provider: "Ollama".to_string(),
                    message: format!("API returned {status}: {body}"),
                }
            } else {
                FixragError::EmbeddingUnavailable {
                    provider: "Ollama".to_string(),
                    message: format!("API returned {status}: {body}"),
                }
            });
        }

        let body: EmbeddingsResponse = response.json().await.map_err(|e| {
            error!(provider = "Ollama", error = %e, "failed to parse embedding response");
            FixragError::EmbeddingUnavailable {
                provider: "Ollama".to_string(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(body.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// A [`LanguageModel`] backed by a local Ollama daemon.
///
/// Uses the non-streaming `/api/generate` endpoint; `GenerateOptions`
/// map onto Ollama's `num_predict`, `stop`, and `temperature` options.
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    /// Create a generator against the default daemon address and model.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_GENERATE_MODEL.to_string(),
        }
    }

    /// Point the generator at a different daemon address.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the generation model (e.g. `tinyllama` on constrained machines).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for OllamaGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for OllamaGenerator {
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        debug!(provider = "Ollama", model = %self.model, prompt_len = prompt.len(), "generating");

        let request_body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateRequestOptions {
                num_predict: options.max_tokens,
                stop: &options.stop,
                temperature: options.temperature,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Ollama", error = %e, "generate request failed");
                FixragError::GenerationFailed {
                    model: self.model.clone(),
                    message: format!("request failed: {e}"),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(provider = "Ollama", %status, "generate API error");
            return Err(FixragError::GenerationFailed {
                model: self.model.clone(),
                message: format!("API returned {status}: {body}"),
            });
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = "Ollama", error = %e, "failed to parse generate response");
            FixragError::GenerationFailed {
                model: self.model.clone(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(body.response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
