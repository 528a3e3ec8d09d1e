//! `docchat-rag` answers questions about a set of documents.
//!
//! Documents are loaded, split into overlapping chunks, embedded and stored
//! in a vector collection owned by one conversation thread. Questions are
//! answered by retrieving the nearest chunks from that collection and asking
//! a chat-completion model to answer from them.
//!
//! The [`RagPipeline`] ties the stages together. Every stage sits behind a
//! trait ([`DocumentLoader`], [`Chunker`], [`EmbeddingProvider`],
//! [`VectorStore`], [`CompletionService`]) so backends can be swapped.
//!
//! # Features
//!
//! - `openai` (default): OpenAI embedding and chat-completion clients
//! - `qdrant`: a persistent [Qdrant](https://qdrant.tech/) vector store

pub mod answer;
pub mod chunking;
pub mod collection;
pub mod completion;
pub mod config;
pub mod credentials;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod runtime;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use answer::{Answerer, extract_answer};
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, chunker_for, split_documents};
pub use collection::{CollectionName, sanitize_thread_id};
pub use completion::{ChatCompletion, ChatMessage, CompletionService, Role};
pub use config::{ChunkStrategy, RagConfig, RagConfigBuilder};
pub use credentials::{ApiKey, Credentials};
pub use document::{ChatTurn, Chunk, Document, IndexedChunk, Metadata, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use loader::{DocumentLoader, FileLoader, LoadOutcome, SourceError, load_sources};
pub use pipeline::{
    GenerateRequest, IngestReport, IngestRequest, RagPipeline, RagPipelineBuilder, SearchReport, SearchRequest,
};
pub use prompt::assemble_prompt;
pub use providers::ModelProviders;
pub use vectorstore::{UpsertOutcome, VectorStore};

#[cfg(feature = "openai")]
pub use openai::{OpenAICompletionService, OpenAIEmbeddingProvider, OpenAIProviders};
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
