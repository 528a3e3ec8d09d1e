//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{IndexedChunk, SearchResult};
use crate::error::{RagError, Result};

/// What an [`upsert`](VectorStore::upsert) did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpsertOutcome {
    /// Number of chunks written.
    pub upserted: usize,
    /// The collection written to, or `None` when there was nothing to write.
    pub collection: Option<String>,
    /// `true` if this call created the collection.
    pub created: bool,
}

impl UpsertOutcome {
    /// The outcome of upserting an empty batch: nothing written, no collection touched.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The error for touching a collection with a model other than the one it was written with.
pub(crate) fn model_mismatch(backend: &str, collection: &str, stored: &str, requested: &str) -> RagError {
    RagError::VectorStoreError {
        backend: backend.to_string(),
        message: format!("collection '{collection}' was embedded with '{stored}', not '{requested}'"),
    }
}

/// A storage backend for vector embeddings with similarity search.
///
/// Collections are created lazily by the first upsert and never deleted.
/// Every chunk passed to `upsert` is stored, so re-ingesting identical
/// content appends duplicates.
///
/// A collection is bound to the embedding model and dimensionality of its
/// first upsert. Later upserts and searches naming another model, or
/// carrying vectors of another length, fail with
/// [`RagError::VectorStoreError`](crate::RagError::VectorStoreError).
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{VectorStore, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.upsert("abc_123", "text-embedding-3-small", &chunks).await?;
/// let results = store.search("abc_123", "text-embedding-3-small", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name used in logs and errors.
    fn backend(&self) -> &str;

    /// Whether the named collection exists.
    async fn collection_exists(&self, collection: &str) -> Result<bool>;

    /// Append chunks embedded by `embedding_model` to a collection, creating it if absent.
    ///
    /// An empty `chunks` slice is a no-op returning [`UpsertOutcome::empty`].
    async fn upsert(&self, collection: &str, embedding_model: &str, chunks: &[IndexedChunk]) -> Result<UpsertOutcome>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending cosine similarity.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CollectionNotFound`](crate::RagError::CollectionNotFound)
    /// if the collection does not exist.
    async fn search(
        &self,
        collection: &str,
        embedding_model: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Number of chunks stored in a collection.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CollectionNotFound`](crate::RagError::CollectionNotFound)
    /// if the collection does not exist.
    async fn count(&self, collection: &str) -> Result<usize>;
}
