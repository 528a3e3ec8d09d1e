//! Configuration for the RAG pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default embedding model shared by ingestion and retrieval.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default chat-completion model used for answer generation.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Default number of texts sent per embedding request.
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 512;

/// Which [`Chunker`](crate::chunking::Chunker) splits loaded documents.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// [`RecursiveChunker`](crate::chunking::RecursiveChunker)
    #[default]
    Recursive,
    /// [`FixedSizeChunker`](crate::chunking::FixedSizeChunker)
    Fixed,
}

impl std::str::FromStr for ChunkStrategy {
    type Err = RagError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "recursive" => Ok(Self::Recursive),
            "fixed" | "fixed-size" => Ok(Self::Fixed),
            other => Err(RagError::ConfigError(format!(
                "unknown chunk strategy '{other}', expected 'recursive' or 'fixed'"
            ))),
        }
    }
}

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    #[serde(default)]
    pub chunk_strategy: ChunkStrategy,
    /// Number of results returned by a search when the caller gives none.
    pub default_top_k: usize,
    /// Embedding model identifier. Every collection is written and read with this model.
    pub embedding_model: String,
    /// Chat-completion model identifier.
    pub completion_model: String,
    /// Maximum number of texts per embedding request during ingestion.
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,
    /// Deadline applied to each external call.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            chunk_strategy: ChunkStrategy::default(),
            default_top_k: 5,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            embedding_batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            request_timeout: Duration::from_secs(60),
        }
    }
}

fn default_embedding_batch_size() -> usize {
    DEFAULT_EMBEDDING_BATCH_SIZE
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
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

    pub fn chunk_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.config.chunk_strategy = strategy;
        self
    }

    /// Set the number of results returned when a search gives no `top_k`.
    pub fn default_top_k(mut self, k: usize) -> Self {
        self.config.default_top_k = k;
        self
    }

    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    pub fn completion_model(mut self, model: impl Into<String>) -> Self {
        self.config.completion_model = model.into();
        self
    }

    /// Set how many texts go into one embedding request.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Set the deadline applied to each embedding, store and completion call.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `default_top_k == 0`
    /// - `embedding_batch_size == 0`
    /// - either model identifier is empty
    /// - `request_timeout` is zero
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.default_top_k == 0 {
            return Err(RagError::ConfigError("default_top_k must be greater than zero".to_string()));
        }
        if config.embedding_batch_size == 0 {
            return Err(RagError::ConfigError("embedding_batch_size must be greater than zero".to_string()));
        }
        if config.embedding_model.trim().is_empty() || config.completion_model.trim().is_empty() {
            return Err(RagError::ConfigError("model identifiers must not be empty".to_string()));
        }
        if config.request_timeout.is_zero() {
            return Err(RagError::ConfigError("request_timeout must be greater than zero".to_string()));
        }
        Ok(config)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = RagConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.default_top_k, 5);
        assert_eq!(config.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.chunk_strategy, ChunkStrategy::Recursive);
        assert_eq!(config.embedding_batch_size, DEFAULT_EMBEDDING_BATCH_SIZE);
    }

    #[test]
    fn builder_accepts_custom_values() {
        let config = RagConfig::builder()
            .chunk_size(256)
            .chunk_overlap(32)
            .default_top_k(3)
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(config.chunk_size, 256);
        assert_eq!(config.chunk_overlap, 32);
        assert_eq!(config.default_top_k, 3);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let result = RagConfig::builder().chunk_size(100).chunk_overlap(100).build();
        assert!(matches!(result, Err(RagError::ConfigError(_))));
    }

    #[test]
    fn rejects_zero_top_k_and_zero_timeout() {
        assert!(RagConfig::builder().default_top_k(0).build().is_err());
        assert!(RagConfig::builder().request_timeout(Duration::ZERO).build().is_err());
        assert!(RagConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
        assert!(RagConfig::builder().embedding_batch_size(0).build().is_err());
    }

    #[test]
    fn chunk_strategy_parses_from_names() {
        assert_eq!("Fixed".parse::<ChunkStrategy>().unwrap(), ChunkStrategy::Fixed);
        assert_eq!("recursive".parse::<ChunkStrategy>().unwrap(), ChunkStrategy::Recursive);
        assert!(matches!("sentences".parse::<ChunkStrategy>(), Err(RagError::ConfigError(_))));
    }
}
