//! Offline flows behind the `docchat search` and `docchat ask` commands.
//!
//! Files, when given, are ingested into the thread before it is queried.
//! With no files the thread's existing collection is queried as is, so a
//! persistent store is not re-filled on every invocation.

use docchat_rag::{GenerateRequest, IngestRequest, RagPipeline, Result, SearchReport, SearchRequest};
use tracing::debug;

async fn ingest_first(pipeline: &RagPipeline, files: Vec<String>, request: &SearchRequest) -> Result<()> {
    if files.is_empty() {
        debug!(thread_id = %request.thread_id, "no files given, querying existing collection");
        return Ok(());
    }
    let ingest = IngestRequest { sources: files, thread_id: request.thread_id.clone(), api_key: request.api_key.clone() };
    pipeline.ingest(ingest).await?;
    Ok(())
}

/// Optionally ingest `files`, then return the chunks nearest to the query.
pub async fn search(pipeline: &RagPipeline, files: Vec<String>, request: SearchRequest) -> Result<SearchReport> {
    ingest_first(pipeline, files, &request).await?;
    pipeline.search(request).await
}

/// Optionally ingest `files`, then answer the query from the nearest chunks.
pub async fn ask(pipeline: &RagPipeline, files: Vec<String>, request: SearchRequest) -> Result<String> {
    ingest_first(pipeline, files, &request).await?;
    let question = request.query.clone();
    let api_key = request.api_key.clone();
    let found = pipeline.search(request).await?;
    pipeline.generate(GenerateRequest { api_key, ..GenerateRequest::new(question, found.chunks()) }).await
}
