//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. Collections
//! live as long as the store, so it suits development, testing, and
//! single-process deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{IndexedChunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{UpsertOutcome, VectorStore, model_mismatch};

const BACKEND: &str = "InMemory";

#[derive(Debug)]
struct MemoryCollection {
    embedding_model: String,
    dimensions: usize,
    /// Insertion order is kept so ties in score resolve deterministically.
    chunks: Vec<IndexedChunk>,
}

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as collection name → chunks in insertion order.
/// All operations are async-safe via `tokio::sync::RwLock`; concurrent
/// upserts to the same collection are serialized by the write lock.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn dimension_mismatch(collection: &str, expected: usize, actual: usize) -> RagError {
    RagError::VectorStoreError {
        backend: BACKEND.to_string(),
        message: format!(
            "collection '{collection}' holds {expected}-dimensional vectors, got {actual}; \
             was it written with a different embedding model?"
        ),
    }
}

impl MemoryCollection {
    fn check(&self, collection: &str, embedding_model: &str, dimensions: usize) -> Result<()> {
        if self.embedding_model != embedding_model {
            return Err(model_mismatch(BACKEND, collection, &self.embedding_model, embedding_model));
        }
        if self.dimensions != dimensions {
            return Err(dimension_mismatch(collection, self.dimensions, dimensions));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(collection))
    }

    async fn upsert(&self, collection: &str, embedding_model: &str, chunks: &[IndexedChunk]) -> Result<UpsertOutcome> {
        let Some(first) = chunks.first() else {
            return Ok(UpsertOutcome::empty());
        };
        let dimensions = first.embedding.len();
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(dimension_mismatch(collection, dimensions, bad.embedding.len()));
        }

        let mut collections = self.collections.write().await;
        let created = !collections.contains_key(collection);
        let store = collections.entry(collection.to_string()).or_insert_with(|| MemoryCollection {
            embedding_model: embedding_model.to_string(),
            dimensions,
            chunks: Vec::new(),
        });
        store.check(collection, embedding_model, dimensions)?;
        store.chunks.extend_from_slice(chunks);

        debug!(collection, count = chunks.len(), created, total = store.chunks.len(), "upserted chunks in memory");
        Ok(UpsertOutcome { upserted: chunks.len(), collection: Some(collection.to_string()), created })
    }

    async fn search(
        &self,
        collection: &str,
        embedding_model: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections
            .get(collection)
            .ok_or_else(|| RagError::CollectionNotFound { collection: collection.to_string() })?;
        store.check(collection, embedding_model, embedding.len())?;

        let mut scored: Vec<SearchResult> = store
            .chunks
            .iter()
            .map(|indexed| SearchResult {
                chunk: indexed.chunk.clone(),
                score: cosine_similarity(&indexed.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|store| store.chunks.len())
            .ok_or_else(|| RagError::CollectionNotFound { collection: collection.to_string() })
    }
}
