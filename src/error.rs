//! Error types for the `fixrag` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in the retrieval and synthesis pipeline.
#[derive(Debug, Error)]
pub enum FixragError {
    /// A configuration parameter failed validation. Rejected eagerly,
    /// before any external call is made; never retried.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The embedding provider could not be reached or returned a server error.
    #[error("embedding provider unreachable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding provider rejected the input itself.
    #[error("embedding input rejected ({provider}): {message}")]
    InvalidEmbeddingInput {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding provider is rate limiting this client.
    #[error("embedding provider rate limited ({provider}): {message}")]
    RateLimited {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index backend failed or could not be reached.
    #[error("vector index unavailable ({backend}): {message}")]
    IndexUnavailable {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The language model call errored.
    #[error("generation failed ({model}): {message}")]
    GenerationFailed {
        /// The model that produced the error.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// An external call exceeded the configured request timeout.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// The operation that was cut off.
        operation: String,
        /// The timeout that was applied.
        timeout: Duration,
    },

    /// The referenced session identifier is unknown.
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    /// A guide source (iFixit API, document directory) failed.
    #[error("guide source error: {0}")]
    GuideSource(String),
}

impl FixragError {
    /// Whether a bounded-backoff retry is worthwhile.
    ///
    /// Timeouts are not retried: the timeout bounds the whole operation,
    /// retries included, so expiry is terminal.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingUnavailable { .. }
                | Self::RateLimited { .. }
                | Self::IndexUnavailable { .. }
                | Self::GenerationFailed { .. }
        )
    }
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, FixragError>;
