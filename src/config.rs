//! Configuration for the chat engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FixragError, Result};

/// Configuration parameters for retrieval and synthesis.
///
/// Model names and provider endpoints are constructor parameters of the
/// provider clients themselves ([`crate::ollama`], [`crate::ifixit`]); this
/// struct holds the knobs that cut across the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from retrieval.
    pub top_k: usize,
    /// Minimum similarity score for a passage to count as context.
    /// Passages below it are discarded before synthesis.
    pub similarity_threshold: f32,
    /// Maximum number of prior turns included in a prompt; older turns are
    /// truncated first.
    pub max_history_turns: usize,
    /// Maximum output length requested from the language model.
    pub max_output_tokens: u32,
    /// Capacity of the retrieval result cache (entries).
    pub cache_capacity: usize,
    /// Timeout applied to each external call on the query path.
    pub request_timeout: Duration,
    /// Attempts (including the first) for transient provider failures.
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 64,
            top_k: 4,
            similarity_threshold: 0.2,
            max_history_turns: 12,
            max_output_tokens: 512,
            cache_capacity: 64,
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

impl EngineConfig {
    /// Create a new builder for constructing an [`EngineConfig`].
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validate that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`FixragError::InvalidConfiguration`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `similarity_threshold` is outside `[-1.0, 1.0]`
    /// - `max_retries == 0`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(FixragError::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(FixragError::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(FixragError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(FixragError::InvalidConfiguration(format!(
                "similarity_threshold ({}) must be within [-1.0, 1.0]",
                self.similarity_threshold
            )));
        }
        if self.max_retries == 0 {
            return Err(FixragError::InvalidConfiguration(
                "max_retries must be at least one".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from retrieval.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity for a passage to count as context.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the maximum number of prior turns included in a prompt.
    pub fn max_history_turns(mut self, turns: usize) -> Self {
        self.config.max_history_turns = turns;
        self
    }

    /// Set the maximum output length requested from the language model.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.config.max_output_tokens = tokens;
        self
    }

    /// Set the retrieval cache capacity in entries.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Set the per-call timeout on the query path.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the attempt budget for transient provider failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Build the [`EngineConfig`], validating that parameters are consistent.
    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_overlap_not_less_than_size() {
        let err = EngineConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, FixragError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_zero_top_k() {
        let err = EngineConfig::builder().top_k(0).build().unwrap_err();
        assert!(matches!(err, FixragError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = EngineConfig::builder().similarity_threshold(1.5).build().unwrap_err();
        assert!(matches!(err, FixragError::InvalidConfiguration(_)));
    }
}
