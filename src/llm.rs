//! Language model trait for answer generation.

use async_trait::async_trait;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Generation parameters passed with each prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateOptions {
    /// Maximum output length in tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Stop sequences that end generation.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub stop: Vec<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// An external language model invoked for answer synthesis.
///
/// The model is a shared, externally-owned resource; implementations wrap
/// a specific inference backend behind this seam.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String>;

    /// Identifier of the underlying model, recorded on answers.
    fn model_id(&self) -> &str;
}
