//! Process configuration read from the environment at startup.

use std::time::Duration;

use anyhow::{Context, bail};
use docchat_rag::credentials::{ApiKey, Credentials, FALLBACK_ENV, PRIMARY_ENV};
use docchat_rag::{ChunkStrategy, RagConfig};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Which vector store backs the collections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VectorStoreKind {
    #[default]
    Memory,
    Qdrant,
}

impl std::str::FromStr for VectorStoreKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" => Ok(Self::Memory),
            "qdrant" => Ok(Self::Qdrant),
            other => bail!("unknown vector store '{other}', expected 'memory' or 'qdrant'"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the OpenAI-compatible API.
    pub api_base_url: String,
    pub vector_store: VectorStoreKind,
    pub qdrant_url: String,
    pub rag: RagConfig,
    pub credentials: Credentials,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_base_url: docchat_rag::openai::DEFAULT_BASE_URL.to_string(),
            vector_store: VectorStoreKind::default(),
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            rag: RagConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`; unset and blank values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().with_context(|| format!("invalid PORT '{raw}'"))?,
            None => defaults.port,
        };
        let vector_store = match get("DOCCHAT_VECTOR_STORE") {
            Some(raw) => raw.parse()?,
            None => defaults.vector_store,
        };

        let mut rag = RagConfig::builder();
        if let Some(size) = parse_usize(&get, "DOCCHAT_CHUNK_SIZE")? {
            rag = rag.chunk_size(size);
        }
        if let Some(overlap) = parse_usize(&get, "DOCCHAT_CHUNK_OVERLAP")? {
            rag = rag.chunk_overlap(overlap);
        }
        if let Some(strategy) = get("DOCCHAT_CHUNKER") {
            rag = rag.chunk_strategy(strategy.parse::<ChunkStrategy>()?);
        }
        if let Some(size) = parse_usize(&get, "DOCCHAT_EMBEDDING_BATCH_SIZE")? {
            rag = rag.embedding_batch_size(size);
        }
        if let Some(model) = get("DOCCHAT_EMBEDDING_MODEL") {
            rag = rag.embedding_model(model);
        }
        if let Some(model) = get("DOCCHAT_COMPLETION_MODEL") {
            rag = rag.completion_model(model);
        }
        if let Some(secs) = parse_usize(&get, "DOCCHAT_REQUEST_TIMEOUT_SECS")? {
            rag = rag.request_timeout(Duration::from_secs(secs as u64));
        }
        let rag = rag.build().context("invalid pipeline configuration")?;

        let credentials =
            Credentials::new(get(PRIMARY_ENV).and_then(ApiKey::new), get(FALLBACK_ENV).and_then(ApiKey::new));

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            api_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.api_base_url),
            vector_store,
            qdrant_url: get("QDRANT_URL").unwrap_or(defaults.qdrant_url),
            rag,
            credentials,
        })
    }
}

fn parse_usize(get: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<usize>> {
    get(name).map(|raw| raw.parse::<usize>().with_context(|| format!("invalid {name} '{raw}'"))).transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.vector_store, VectorStoreKind::Memory);
        assert_eq!(config.rag, RagConfig::default());
        assert!(config.credentials.resolve(None).is_err());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DOCCHAT_VECTOR_STORE", "Qdrant"),
            ("DOCCHAT_CHUNK_SIZE", "500"),
            ("DOCCHAT_CHUNK_OVERLAP", "50"),
            ("DOCCHAT_REQUEST_TIMEOUT_SECS", "5"),
            ("DOCCHAT_CHUNKER", "fixed"),
            ("DOCCHAT_EMBEDDING_BATCH_SIZE", "64"),
            ("LLM_API_KEY", "fallback-key"),
        ])
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.vector_store, VectorStoreKind::Qdrant);
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.chunk_overlap, 50);
        assert_eq!(config.rag.request_timeout, Duration::from_secs(5));
        assert_eq!(config.rag.chunk_strategy, ChunkStrategy::Fixed);
        assert_eq!(config.rag.embedding_batch_size, 64);
        assert_eq!(config.credentials.resolve(None).unwrap().expose(), "fallback-key");
    }

    #[test]
    fn primary_key_wins_over_fallback() {
        let config = config_from(&[("OPENAI_API_KEY", "primary"), ("LLM_API_KEY", "fallback")]).unwrap();
        assert_eq!(config.credentials.resolve(None).unwrap().expose(), "primary");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("DOCCHAT_VECTOR_STORE", "redis")]).is_err());
        assert!(config_from(&[("DOCCHAT_CHUNKER", "sentences")]).is_err());
        assert!(config_from(&[("DOCCHAT_EMBEDDING_BATCH_SIZE", "0")]).is_err());
        assert!(config_from(&[("DOCCHAT_CHUNK_SIZE", "100"), ("DOCCHAT_CHUNK_OVERLAP", "100")]).is_err());
    }
}
