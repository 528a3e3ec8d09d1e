//! OpenAI embedding and chat-completion clients.
//!
//! Both call the REST API directly with `reqwest`. The API key is passed in
//! per instance; nothing here reads or writes the environment. Every request
//! is bounded by the client timeout and a timed-out request surfaces as
//! [`RagError::Timeout`].
//!
//! This module is only available when the `openai` feature is enabled.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::completion::{ChatCompletion, ChatMessage, CompletionService};
use crate::config::RagConfig;
use crate::credentials::ApiKey;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::providers::ModelProviders;

/// The default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "OpenAI";

/// Most inputs the embeddings endpoint accepts in one request.
pub const MAX_EMBEDDING_INPUTS: usize = 2048;

/// Build the shared HTTP client with a per-request `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))
}

/// Connection details shared by the embedding and completion clients.
#[derive(Clone)]
struct Endpoint {
    client: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl Endpoint {
    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    /// POST `body` to `path` and decode the JSON response.
    ///
    /// `fail` builds the service-specific error from a message.
    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        service: &str,
        path: &str,
        body: &B,
        fail: impl Fn(String) -> RagError,
    ) -> Result<R> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(self.api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, service, error = %e, "request failed");
                if e.is_timeout() {
                    RagError::Timeout { service: service.to_string(), after: self.timeout }
                } else {
                    fail(format!("request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);

            error!(provider = PROVIDER, service, %status, "API error");
            return Err(fail(format!("API returned {status}: {detail}")));
        }

        response.json::<R>().await.map_err(|e| {
            error!(provider = PROVIDER, service, error = %e, "failed to parse response");
            if e.is_timeout() {
                RagError::Timeout { service: service.to_string(), after: self.timeout }
            } else {
                fail(format!("failed to parse response: {e}"))
            }
        })
    }
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new(client, DEFAULT_BASE_URL, key, "text-embedding-3-small", timeout);
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    endpoint: Endpoint,
    model: String,
}

impl OpenAIEmbeddingProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: ApiKey,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self { endpoint: Endpoint { client, base_url: base_url.into(), api_key, timeout }, model: model.into() }
    }

    /// Embed at most [`MAX_EMBEDDING_INPUTS`] texts in a single request.
    async fn embed_request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest { model: &self.model, input: texts.to_vec() };
        let response: EmbeddingResponse =
            self.endpoint.post_json("embedding", "embeddings", &request, embedding_error).await?;

        if response.data.len() != texts.len() {
            return Err(embedding_error(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        let mut data = response.data;
        // The API documents `index`; restore input order if it is present.
        if data.iter().all(|d| d.index.is_some()) {
            data.sort_by_key(|d| d.index);
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

fn embedding_error(message: String) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.into(), message }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| embedding_error("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let mut embeddings = Vec::with_capacity(texts.len());
        for request in texts.chunks(MAX_EMBEDDING_INPUTS) {
            embeddings.extend(self.embed_request(request).await?);
        }
        Ok(embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// A [`CompletionService`] backed by the OpenAI chat-completions API.
///
/// Only `model` and `messages` are sent; sampling parameters stay at the
/// service defaults.
pub struct OpenAICompletionService {
    endpoint: Endpoint,
    model: String,
}

impl OpenAICompletionService {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: ApiKey,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self { endpoint: Endpoint { client, base_url: base_url.into(), api_key, timeout }, model: model.into() }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

fn completion_error(message: String) -> RagError {
    RagError::CompletionError { provider: PROVIDER.into(), message }
}

#[async_trait]
impl CompletionService for OpenAICompletionService {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion> {
        debug!(provider = PROVIDER, model = %self.model, message_count = messages.len(), "chat completion");
        let request = CompletionRequest { model: &self.model, messages };
        self.endpoint.post_json("completion", "chat/completions", &request, completion_error).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ── Provider factory ───────────────────────────────────────────────

/// Builds OpenAI clients for a resolved key, sharing one HTTP connection pool.
#[derive(Clone)]
pub struct OpenAIProviders {
    client: reqwest::Client,
    base_url: String,
    embedding_model: String,
    completion_model: String,
    timeout: Duration,
}

impl OpenAIProviders {
    /// Create a factory using the models and timeout from `config`.
    pub fn from_config(config: &RagConfig, base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client(config.request_timeout)?,
            base_url: base_url.into(),
            embedding_model: config.embedding_model.clone(),
            completion_model: config.completion_model.clone(),
            timeout: config.request_timeout,
        })
    }
}

impl ModelProviders for OpenAIProviders {
    fn embedder(&self, key: &ApiKey) -> Result<Arc<dyn EmbeddingProvider>> {
        Ok(Arc::new(OpenAIEmbeddingProvider::new(
            self.client.clone(),
            self.base_url.clone(),
            key.clone(),
            self.embedding_model.clone(),
            self.timeout,
        )))
    }

    fn completion(&self, key: &ApiKey) -> Result<Arc<dyn CompletionService>> {
        Ok(Arc::new(OpenAICompletionService::new(
            self.client.clone(),
            self.base_url.clone(),
            key.clone(),
            self.completion_model.clone(),
            self.timeout,
        )))
    }
}
