//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//! Collections persist in the Qdrant server across process restarts.
//!
//! This module is only available when the `qdrant` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334", Duration::from_secs(30))?;
//! store.upsert("abc_123", "text-embedding-3-small", &chunks).await?;
//! let results = store.search("abc_123", "text-embedding-3-small", &query_embedding, 5).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, ScrollPointsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::document::{Chunk, IndexedChunk, Metadata, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{UpsertOutcome, VectorStore, model_mismatch};

const BACKEND: &str = "qdrant";

/// Payload key recording which embedding model produced a point's vector.
const MODEL_KEY: &str = "embedding_model";

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Each collection maps to a Qdrant collection with cosine distance. Chunk
/// text, metadata and the embedding model are stored as point payload;
/// point ids are the store-assigned UUIDs of the [`IndexedChunk`]s. The
/// model of an existing collection is read back from one of its points, so
/// the binding survives process restarts.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to the Qdrant server at `url`; every call is bounded by `timeout`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Qdrant::from_url(url).timeout(timeout).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: e.to_string() }
    }

    fn payload_for(chunk: &Chunk, embedding_model: &str) -> Result<Payload> {
        let mut payload = Map::new();
        payload.insert("text".to_string(), Value::String(chunk.text.clone()));
        payload.insert("metadata".to_string(), Value::Object(chunk.metadata.clone().into_iter().collect()));
        payload.insert(MODEL_KEY.to_string(), Value::String(embedding_model.to_string()));
        Payload::try_from(Value::Object(payload)).map_err(|e| RagError::VectorStoreError {
            backend: BACKEND.to_string(),
            message: format!("failed to build point payload: {e}"),
        })
    }

    /// The embedding model recorded on the collection's points, if any point carries one.
    async fn stored_model(&self, collection: &str) -> Result<Option<String>> {
        let response = self
            .client
            .scroll(ScrollPointsBuilder::new(collection).limit(1).with_payload(true))
            .await
            .map_err(Self::map_err)?;
        Ok(response.result.into_iter().next().and_then(|point| {
            point.payload.get(MODEL_KEY).and_then(|v| match &v.kind {
                Some(Kind::StringValue(model)) => Some(model.clone()),
                _ => None,
            })
        }))
    }

    async fn check_model(&self, collection: &str, embedding_model: &str) -> Result<()> {
        match self.stored_model(collection).await? {
            Some(stored) if stored != embedding_model => {
                Err(model_mismatch(BACKEND, collection, &stored, embedding_model))
            }
            _ => Ok(()),
        }
    }
}

/// Convert a Qdrant payload value back to JSON.
fn to_json(value: &QdrantValue) -> Value {
    match &value.kind {
        Some(Kind::NullValue(_)) | None => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(*b),
        Some(Kind::IntegerValue(i)) => Value::from(*i),
        Some(Kind::DoubleValue(d)) => Number::from_f64(*d).map(Value::Number).unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s.clone()),
        Some(Kind::ListValue(list)) => Value::Array(list.values.iter().map(to_json).collect()),
        Some(Kind::StructValue(s)) => {
            Value::Object(s.fields.iter().map(|(k, v)| (k.clone(), to_json(v))).collect())
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        self.client.collection_exists(collection).await.map_err(Self::map_err)
    }

    async fn upsert(&self, collection: &str, embedding_model: &str, chunks: &[IndexedChunk]) -> Result<UpsertOutcome> {
        let Some(first) = chunks.first() else {
            return Ok(UpsertOutcome::empty());
        };

        let mut created = false;
        if self.collection_exists(collection).await? {
            self.check_model(collection, embedding_model).await?;
        } else {
            let dimensions = first.embedding.len() as u64;
            let create = self
                .client
                .create_collection(
                    CreateCollectionBuilder::new(collection)
                        .vectors_config(VectorParamsBuilder::new(dimensions, Distance::Cosine)),
                )
                .await;
            match create {
                Ok(_) => {
                    created = true;
                    debug!(collection, dimensions, "created qdrant collection");
                }
                // Another writer may have created it between the check and the create.
                Err(e) => {
                    if !self.collection_exists(collection).await? {
                        return Err(Self::map_err(e));
                    }
                    warn!(collection, error = %e, "collection appeared concurrently, appending");
                    self.check_model(collection, embedding_model).await?;
                }
            }
        }

        let points = chunks
            .iter()
            .map(|indexed| {
                let payload = Self::payload_for(&indexed.chunk, embedding_model)?;
                Ok(PointStruct::new(indexed.id.clone(), indexed.embedding.clone(), payload))
            })
            .collect::<Result<Vec<PointStruct>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = chunks.len(), created, "upserted chunks to qdrant");
        Ok(UpsertOutcome { upserted: chunks.len(), collection: Some(collection.to_string()), created })
    }

    async fn search(
        &self,
        collection: &str,
        embedding_model: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if !self.collection_exists(collection).await? {
            return Err(RagError::CollectionNotFound { collection: collection.to_string() });
        }
        self.check_model(collection, embedding_model).await?;

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64).with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let results = response
            .result
            .into_iter()
            .map(|scored| {
                let text = scored
                    .payload
                    .get("text")
                    .and_then(|v| match &v.kind {
                        Some(Kind::StringValue(s)) => Some(s.clone()),
                        _ => None,
                    })
                    .unwrap_or_default();

                let metadata: Metadata = match scored.payload.get("metadata").map(to_json) {
                    Some(Value::Object(map)) => map.into_iter().collect(),
                    _ => Metadata::new(),
                };

                SearchResult { chunk: Chunk { text, metadata }, score: scored.score }
            })
            .collect();

        Ok(results)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        if !self.collection_exists(collection).await? {
            return Err(RagError::CollectionNotFound { collection: collection.to_string() });
        }
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(Self::map_err)?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_text_metadata_and_model() {
        let chunk = Chunk { text: "hello".to_string(), ..Default::default() };
        let payload: std::collections::HashMap<String, QdrantValue> =
            QdrantVectorStore::payload_for(&chunk, "text-embedding-3-small").unwrap().into();

        assert_eq!(to_json(&payload["text"]), Value::String("hello".into()));
        assert_eq!(to_json(&payload[MODEL_KEY]), Value::String("text-embedding-3-small".into()));
        assert!(matches!(to_json(&payload["metadata"]), Value::Object(_)));
    }
}
