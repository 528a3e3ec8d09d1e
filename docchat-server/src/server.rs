use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use docchat_rag::{
    GenerateRequest, InMemoryVectorStore, IngestRequest, OpenAIProviders, RagPipeline, SearchRequest, VectorStore,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    config::{ServerConfig, VectorStoreKind},
    error::ApiError,
    wire::{
        EmbeddingsRequest, EmbeddingsResponse, LlmGenerateRequest, LlmGenerateResponse, SimilaritySearchRequest,
        SimilaritySearchResponse, StatusResponse,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    pub fn new(pipeline: RagPipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }

    /// Build the pipeline described by `config`: OpenAI models and the selected vector store.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let providers = OpenAIProviders::from_config(&config.rag, config.api_base_url.clone())
            .context("failed to configure model providers")?;
        let pipeline = RagPipeline::builder()
            .config(config.rag.clone())
            .credentials(config.credentials.clone())
            .providers(Arc::new(providers))
            .vector_store(build_vector_store(config)?)
            .build()
            .context("failed to build pipeline")?;
        Ok(Self::new(pipeline))
    }
}

fn build_vector_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn VectorStore>> {
    match config.vector_store {
        VectorStoreKind::Memory => Ok(Arc::new(InMemoryVectorStore::new())),
        #[cfg(feature = "qdrant")]
        VectorStoreKind::Qdrant => {
            let store = docchat_rag::QdrantVectorStore::new(&config.qdrant_url, config.rag.request_timeout)
                .with_context(|| format!("failed to connect to qdrant at {}", config.qdrant_url))?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "qdrant"))]
        VectorStoreKind::Qdrant => {
            anyhow::bail!("the qdrant vector store requires building with the `qdrant` feature")
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/embeddings", post(create_embeddings))
        .route("/api/similaritySearch", post(similarity_search))
        .route("/api/llmGenerate", post(llm_generate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for docchat server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        vector_store = ?config.vector_store,
        embedding_model = %config.rag.embedding_model,
        completion_model = %config.rag.completion_model,
        "docchat listening on http://{}",
        addr
    );
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

async fn index() -> impl IntoResponse {
    Json(StatusResponse { message: "docchat server is running!".to_string() })
}

async fn create_embeddings(
    State(state): State<AppState>,
    payload: Result<Json<EmbeddingsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EmbeddingsResponse>), ApiError> {
    let Json(request) = payload?;
    let report = state
        .pipeline
        .ingest(IngestRequest { sources: request.sources(), thread_id: request.thread_id(), api_key: request.api_key() })
        .await
        .map_err(ApiError::during("Failed to create embeddings"))?;

    let status = if report.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(report.into())))
}

async fn similarity_search(
    State(state): State<AppState>,
    payload: Result<Json<SimilaritySearchRequest>, JsonRejection>,
) -> Result<Json<SimilaritySearchResponse>, ApiError> {
    let Json(request) = payload?;
    let report = state
        .pipeline
        .search(SearchRequest {
            query: request.query(),
            thread_id: request.thread_id(),
            api_key: request.api_key(),
            top_k: request.top_k()?,
        })
        .await
        .map_err(ApiError::during("Similarity search failed"))?;

    Ok(Json(report.into()))
}

async fn llm_generate(
    State(state): State<AppState>,
    payload: Result<Json<LlmGenerateRequest>, JsonRejection>,
) -> Result<Json<LlmGenerateResponse>, ApiError> {
    let Json(request) = payload?;
    let answer = state
        .pipeline
        .generate(GenerateRequest {
            query: request.query(),
            chunks: request.chunks()?,
            chat_history: request.chat_history()?,
            api_key: request.api_key(),
        })
        .await
        .map_err(ApiError::during("Answer generation failed"))?;

    Ok(Json(LlmGenerateResponse { answer }))
}
