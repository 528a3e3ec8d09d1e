#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use docchat_rag::completion::{CompletionChoice, CompletionMessage};
use docchat_rag::{
    ApiKey, ChatCompletion, ChatMessage, CompletionService, Credentials, EmbeddingProvider, InMemoryVectorStore,
    ModelProviders, RagConfig, RagError, RagPipeline,
};
use serde_json::{Value, json};

/// Vowel counts plus one bucket for everything else.
pub struct VowelEmbedder;

#[async_trait]
impl EmbeddingProvider for VowelEmbedder {
    async fn embed(&self, text: &str) -> docchat_rag::Result<Vec<f32>> {
        let mut v = vec![0.0f32; 6];
        for c in text.to_lowercase().chars() {
            let slot = "aeiou".find(c).unwrap_or(5);
            v[slot] += 1.0;
        }
        Ok(v)
    }

    fn model(&self) -> &str {
        "vowels"
    }
}

pub struct FixedCompletion(Option<Value>);

#[async_trait]
impl CompletionService for FixedCompletion {
    async fn complete(&self, _messages: &[ChatMessage]) -> docchat_rag::Result<ChatCompletion> {
        Ok(ChatCompletion { choices: vec![CompletionChoice { message: CompletionMessage { content: self.0.clone() } }] })
    }

    fn model(&self) -> &str {
        "fixed"
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> docchat_rag::Result<Vec<f32>> {
        Err(RagError::EmbeddingError { provider: "mock".into(), message: "quota exceeded".into() })
    }

    fn model(&self) -> &str {
        "failing"
    }
}

pub struct Providers {
    pub reply: Option<Value>,
    pub embeddings_fail: bool,
}

impl Providers {
    pub fn answering(reply: &str) -> Self {
        Self { reply: Some(json!(reply)), embeddings_fail: false }
    }
}

impl ModelProviders for Providers {
    fn embedder(&self, _key: &ApiKey) -> docchat_rag::Result<Arc<dyn EmbeddingProvider>> {
        let embedder: Arc<dyn EmbeddingProvider> =
            if self.embeddings_fail { Arc::new(FailingEmbedder) } else { Arc::new(VowelEmbedder) };
        Ok(embedder)
    }

    fn completion(&self, _key: &ApiKey) -> docchat_rag::Result<Arc<dyn CompletionService>> {
        Ok(Arc::new(FixedCompletion(self.reply.clone())))
    }
}

pub fn env_credentials() -> Credentials {
    Credentials::new(ApiKey::new("env-key"), None)
}

/// A pipeline over a fresh in-memory store, chunking at 25 characters.
pub fn pipeline_with(providers: Providers, credentials: Credentials) -> RagPipeline {
    let config = RagConfig::builder().chunk_size(25).chunk_overlap(0).build().expect("valid config");
    RagPipeline::builder()
        .config(config)
        .credentials(credentials)
        .providers(Arc::new(providers))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .expect("pipeline")
}

pub fn write_source(dir: &tempfile::TempDir, name: &str, text: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, text).expect("write source");
    path.to_string_lossy().into_owned()
}

pub const FRUIT: &str = "Apples are red.\n\nBananas are yellow.\n\nGrapes are purple.";
