//! Data types for documents, chunks, and search results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar metadata attached to documents and chunks.
///
/// A `BTreeMap` keeps serialization order stable across runs.
pub type Metadata = BTreeMap<String, Value>;

/// Metadata key holding the origin path of a document.
pub const SOURCE_KEY: &str = "source";

/// Metadata key holding the zero-based page (or segment) number.
pub const PAGE_KEY: &str = "page";

/// Raw text loaded from one page or segment of a source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The text content of the document.
    pub text: String,
    /// Source-identifying metadata (`source`, `page`).
    pub metadata: Metadata,
}

impl Document {
    /// Create a document for the given page of `source`.
    pub fn new(text: impl Into<String>, source: impl Into<String>, page: u32) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), Value::String(source.into()));
        metadata.insert(PAGE_KEY.to_string(), Value::from(page));
        Self { text: text.into(), metadata }
    }

    /// The origin path recorded in the metadata, if any.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(Value::as_str)
    }
}

/// A bounded text window derived from a [`Document`].
///
/// Chunks carry their parent's metadata unchanged. This is also the wire
/// shape `{text, metadata}` returned by retrieval and accepted by generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Chunk {
    /// The text content of the chunk.
    pub text: String,
    /// Metadata inherited from the parent document.
    #[serde(default)]
    pub metadata: Metadata,
}

/// A [`Chunk`] paired with its embedding, as held by a vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    /// Store-assigned identifier, unique per upsert.
    pub id: String,
    /// The chunk itself.
    pub chunk: Chunk,
    /// The vector embedding for the chunk's text.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A prior (question, answer) exchange supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { question: question.into(), answer: answer.into() }
    }
}
