//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] exposes three independent entry points:
//!
//! - [`ingest`](RagPipeline::ingest): load → chunk → embed → upsert
//! - [`search`](RagPipeline::search): embed query → nearest-neighbor search
//! - [`generate`](RagPipeline::generate): assemble prompt → completion → answer
//!
//! Each call validates its request, resolves the API key for that call
//! alone, and runs its external calls one after another, each bounded by
//! the configured request timeout. Nothing is retried. The only state shared
//! between calls is the vector store.
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_rag::{RagPipeline, RagConfig, InMemoryVectorStore, IngestRequest};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .credentials(Credentials::from_env())
//!     .providers(Arc::new(OpenAIProviders::from_config(&config, DEFAULT_BASE_URL)?))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! let report = pipeline.ingest(IngestRequest::new(vec!["paper.pdf".into()], "thread 1")).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::answer::Answerer;
use crate::chunking::{Chunker, chunker_for, split_documents};
use crate::collection::CollectionName;
use crate::config::RagConfig;
use crate::credentials::Credentials;
use crate::document::{ChatTurn, Chunk, IndexedChunk, SearchResult};
use crate::error::{RagError, Result};
use crate::loader::{DocumentLoader, FileLoader, load_sources};
use crate::prompt::assemble_prompt;
use crate::providers::ModelProviders;
use crate::vectorstore::VectorStore;

/// Sources to ingest into a thread's collection.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    /// Source identifiers, passed to the loader as given; blank entries are ignored.
    pub sources: Vec<String>,
    pub thread_id: String,
    /// Caller-supplied API key, preferred over the configured credentials.
    pub api_key: Option<String>,
}

impl IngestRequest {
    pub fn new(sources: Vec<String>, thread_id: impl Into<String>) -> Self {
        Self { sources, thread_id: thread_id.into(), api_key: None }
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub thread_id: String,
    pub collection: CollectionName,
    /// Documents loaded across all sources.
    pub documents: usize,
    /// Chunks written to the collection by this call.
    pub chunks: usize,
    /// `true` if this call created the collection.
    pub created: bool,
}

/// A similarity search within a thread's collection.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub thread_id: String,
    pub api_key: Option<String>,
    /// Number of results; the configured default when `None`.
    pub top_k: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self { query: query.into(), thread_id: thread_id.into(), ..Default::default() }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

/// Ranked results of a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub thread_id: String,
    pub collection: CollectionName,
    pub results: Vec<SearchResult>,
}

impl SearchReport {
    /// The retrieved chunks in rank order, without scores.
    pub fn chunks(&self) -> Vec<Chunk> {
        self.results.iter().map(|r| r.chunk.clone()).collect()
    }
}

/// An answer request over caller-supplied context.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub query: String,
    /// Retrieved chunks to ground the answer in; may be empty.
    pub chunks: Vec<Chunk>,
    /// Prior turns, oldest first.
    pub chat_history: Vec<ChatTurn>,
    pub api_key: Option<String>,
}

impl GenerateRequest {
    pub fn new(query: impl Into<String>, chunks: Vec<Chunk>) -> Self {
        Self { query: query.into(), chunks, ..Default::default() }
    }
}

/// The RAG pipeline orchestrator. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    credentials: Credentials,
    providers: Arc<dyn ModelProviders>,
    vector_store: Arc<dyn VectorStore>,
    loader: Arc<dyn DocumentLoader>,
    chunker: Arc<dyn Chunker>,
}

fn require_text<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RagError::validation(message));
    }
    Ok(trimmed)
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Run `call` against `service`, failing with [`RagError::Timeout`] past the deadline.
    async fn with_deadline<T>(&self, service: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        let after = self.config.request_timeout;
        match tokio::time::timeout(after, call).await {
            Ok(result) => result,
            Err(_) => {
                error!(service, ?after, "external call timed out");
                Err(RagError::Timeout { service: service.to_string(), after })
            }
        }
    }

    /// Ingest sources into the collection for `request.thread_id`.
    ///
    /// The batch is atomic with respect to missing sources: if any source
    /// cannot be read, nothing is embedded or written.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] for an empty source list or blank thread id
    /// - [`RagError::MissingCredential`] if no key resolves
    /// - [`RagError::MissingSources`] if any source is missing or unreadable
    /// - [`RagError::EmptyResult`] if no documents or no chunks were produced
    /// - upstream and [`RagError::Timeout`] errors from embedding or the store
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReport> {
        let sources: Vec<&str> =
            request.sources.iter().map(String::as_str).filter(|s| !s.trim().is_empty()).collect();
        if sources.is_empty() {
            return Err(RagError::validation("pdfPaths must be a non-empty array of paths"));
        }
        let collection = CollectionName::from_thread_id(&request.thread_id)?;
        let key = self.credentials.resolve(request.api_key.as_deref())?;

        // 1. Load every source; any missing one aborts the batch
        let loaded = load_sources(self.loader.as_ref(), &sources).await;
        if !loaded.is_complete() {
            warn!(%collection, missing = ?loaded.missing, "aborting ingestion, sources missing");
            return Err(RagError::MissingSources { missing: loaded.missing });
        }
        if loaded.documents.is_empty() {
            return Err(RagError::EmptyResult("No documents could be loaded from the provided paths".into()));
        }
        let documents = loaded.documents.len();

        // 2. Chunk
        let chunks = split_documents(self.chunker.as_ref(), &loaded.documents);
        if chunks.is_empty() {
            return Err(RagError::EmptyResult("The provided documents contain no text to index".into()));
        }

        // 3. Embed in bounded batches, one request at a time
        let embedder = self.providers.embedder(&key)?;
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.embedding_batch_size) {
            let vectors = self
                .with_deadline("embedding", embedder.embed_batch(batch))
                .await
                .inspect_err(|e| error!(%collection, error = %e, "embedding failed during ingestion"))?;
            if vectors.len() != batch.len() {
                return Err(RagError::EmbeddingError {
                    provider: embedder.model().to_string(),
                    message: format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
                });
            }
            embeddings.extend(vectors);
        }

        // 4. Upsert, creating the collection on first use
        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { id: Uuid::new_v4().to_string(), chunk, embedding })
            .collect();
        let outcome = self
            .with_deadline("vector store", self.vector_store.upsert(collection.as_str(), embedder.model(), &indexed))
            .await
            .inspect_err(|e| error!(%collection, error = %e, "upsert failed during ingestion"))?;
        if outcome.upserted == 0 {
            return Err(RagError::EmptyResult("No chunks were written to the vector store".into()));
        }

        info!(
            %collection,
            documents,
            chunk_count = outcome.upserted,
            created = outcome.created,
            backend = self.vector_store.backend(),
            "ingested sources"
        );

        Ok(IngestReport {
            thread_id: request.thread_id,
            collection,
            documents,
            chunks: outcome.upserted,
            created: outcome.created,
        })
    }

    /// Search the collection for `request.thread_id`.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] for a blank query or thread id, or `top_k == 0`
    /// - [`RagError::MissingCredential`] if no key resolves
    /// - [`RagError::CollectionNotFound`] if nothing was ever ingested for the thread
    /// - upstream and [`RagError::Timeout`] errors from embedding or the store
    pub async fn search(&self, request: SearchRequest) -> Result<SearchReport> {
        let query = require_text(&request.query, "query is required and must be a non-empty string")?;
        let collection = CollectionName::from_thread_id(&request.thread_id)?;
        let top_k = request.top_k.unwrap_or(self.config.default_top_k);
        if top_k == 0 {
            return Err(RagError::validation("topK must be a positive integer"));
        }
        let key = self.credentials.resolve(request.api_key.as_deref())?;

        // 1. Embed the query with the same model the collection was written with
        let embedder = self.providers.embedder(&key)?;
        let query_embedding = self
            .with_deadline("embedding", embedder.embed(query))
            .await
            .inspect_err(|e| error!(error = %e, "embedding failed during query"))?;

        // 2. Search the vector store
        let search = self.vector_store.search(collection.as_str(), embedder.model(), &query_embedding, top_k);
        let results = self
            .with_deadline("vector store", search)
            .await
            .inspect_err(|e| match e {
                RagError::CollectionNotFound { .. } => warn!(%collection, "search on unknown collection"),
                _ => error!(%collection, error = %e, "vector store search failed"),
            })?;

        info!(%collection, top_k, result_count = results.len(), "search completed");

        Ok(SearchReport { thread_id: request.thread_id, collection, results })
    }

    /// Answer `request.query` from the supplied chunks and chat history.
    ///
    /// An empty chunk list is allowed; the model then sees an empty context.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] for a blank query
    /// - [`RagError::MissingCredential`] if no key resolves
    /// - [`RagError::InvalidCompletionResponse`] if the reply is not plain text
    /// - upstream and [`RagError::Timeout`] errors from the completion call
    pub async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let query = require_text(&request.query, "query is required and must be a non-empty string")?;
        let key = self.credentials.resolve(request.api_key.as_deref())?;

        let messages = assemble_prompt(&request.chunks, &request.chat_history, query);
        let answerer = Answerer::new(self.providers.completion(&key)?);
        let answer = self.with_deadline("completion", answerer.generate(&messages)).await?;

        info!(
            context_chunks = request.chunks.len(),
            history_turns = request.chat_history.len(),
            answer_len = answer.len(),
            "generated answer"
        );
        Ok(answer)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `providers` and `vector_store` are required. `config` defaults to
/// [`RagConfig::default`], `credentials` to none (callers must then pass a
/// key per request), `loader` to [`FileLoader`], and `chunker` to the
/// strategy named by the config, see [`chunker_for`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    credentials: Credentials,
    providers: Option<Arc<dyn ModelProviders>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    loader: Option<Arc<dyn DocumentLoader>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the process-level fallback credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the factory for embedding and completion clients.
    pub fn providers(mut self, providers: Arc<dyn ModelProviders>) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the source loader.
    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        let providers =
            self.providers.ok_or_else(|| RagError::ConfigError("providers is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let loader = self.loader.unwrap_or_else(|| Arc::new(FileLoader::new()));
        let chunker = self.chunker.unwrap_or_else(|| chunker_for(&config));

        Ok(RagPipeline { config, credentials: self.credentials, providers, vector_store, loader, chunker })
    }
}
