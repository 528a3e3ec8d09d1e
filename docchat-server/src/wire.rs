//! JSON request and response bodies for the HTTP API.
//!
//! Request fields are read leniently: non-string source paths and chunks
//! without text are dropped rather than rejected, and a field of the wrong
//! type is treated as absent so the pipeline's own validation reports it.

use docchat_rag::{ChatTurn, Chunk, IngestReport, Metadata, SearchReport};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

fn string_field(value: &Option<Value>) -> String {
    value.as_ref().and_then(Value::as_str).unwrap_or_default().to_string()
}

fn optional_string(value: &Option<Value>) -> Option<String> {
    value.as_ref().and_then(Value::as_str).map(str::to_string)
}

/// Entries of an optional array field; `null` or absent is empty, any other non-array is an error.
fn array_field<'a>(value: &'a Option<Value>, name: &str) -> Result<&'a [Value], ApiError> {
    match value {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ApiError::bad_request(format!("{name} must be an array"))),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingsRequest {
    pub pdf_paths: Option<Value>,
    pub thread_id: Option<Value>,
    pub api_key: Option<Value>,
}

impl EmbeddingsRequest {
    /// The string entries of `pdfPaths`, in order.
    pub fn sources(&self) -> Vec<String> {
        match &self.pdf_paths {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
            _ => Vec::new(),
        }
    }

    pub fn thread_id(&self) -> String {
        string_field(&self.thread_id)
    }

    pub fn api_key(&self) -> Option<String> {
        optional_string(&self.api_key)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingsResponse {
    pub message: String,
    pub thread_id: String,
    pub documents: usize,
    pub chunks: usize,
    pub vector_collection: String,
}

impl From<IngestReport> for EmbeddingsResponse {
    fn from(report: IngestReport) -> Self {
        let message = if report.created {
            "Embeddings created and stored in a new collection"
        } else {
            "Embeddings added to the existing collection"
        };
        Self {
            message: message.to_string(),
            thread_id: report.thread_id,
            documents: report.documents,
            chunks: report.chunks,
            vector_collection: report.collection.into_inner(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimilaritySearchRequest {
    pub query: Option<Value>,
    pub thread_id: Option<Value>,
    pub api_key: Option<Value>,
    pub top_k: Option<Value>,
}

impl SimilaritySearchRequest {
    pub fn query(&self) -> String {
        string_field(&self.query)
    }

    pub fn thread_id(&self) -> String {
        string_field(&self.thread_id)
    }

    pub fn api_key(&self) -> Option<String> {
        optional_string(&self.api_key)
    }

    /// `topK` when present; it must be a positive integer.
    pub fn top_k(&self) -> Result<Option<usize>, ApiError> {
        match &self.top_k {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .filter(|&k| k > 0)
                .map(|k| Some(k as usize))
                .ok_or_else(|| ApiError::bad_request("topK must be a positive integer")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireChunk {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl From<Chunk> for WireChunk {
    fn from(chunk: Chunk) -> Self {
        Self { text: chunk.text, metadata: chunk.metadata }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilaritySearchResponse {
    pub thread_id: String,
    pub vector_collection: String,
    pub chunks: Vec<WireChunk>,
}

impl From<SearchReport> for SimilaritySearchResponse {
    fn from(report: SearchReport) -> Self {
        Self {
            thread_id: report.thread_id,
            vector_collection: report.collection.into_inner(),
            chunks: report.results.into_iter().map(|r| r.chunk.into()).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmGenerateRequest {
    pub query: Option<Value>,
    pub chunks: Option<Value>,
    pub api_key: Option<Value>,
    pub chat_history: Option<Value>,
}

impl LlmGenerateRequest {
    pub fn query(&self) -> String {
        string_field(&self.query)
    }

    pub fn api_key(&self) -> Option<String> {
        optional_string(&self.api_key)
    }

    /// Chunks with a string `text`; anything else is skipped.
    pub fn chunks(&self) -> Result<Vec<Chunk>, ApiError> {
        let chunks = array_field(&self.chunks, "chunks")?
            .iter()
            .filter_map(|item| {
                let text = item.get("text")?.as_str()?.to_string();
                let metadata = match item.get("metadata") {
                    Some(Value::Object(map)) => map.clone().into_iter().collect(),
                    _ => Metadata::new(),
                };
                Some(Chunk { text, metadata })
            })
            .collect();
        Ok(chunks)
    }

    /// Turns with string `question` and `answer`, oldest first.
    pub fn chat_history(&self) -> Result<Vec<ChatTurn>, ApiError> {
        let turns = array_field(&self.chat_history, "chatHistory")?
            .iter()
            .filter_map(|item| {
                let question = item.get("question")?.as_str()?;
                let answer = item.get("answer")?.as_str()?;
                Some(ChatTurn::new(question, answer))
            })
            .collect();
        Ok(turns)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LlmGenerateResponse {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
}
