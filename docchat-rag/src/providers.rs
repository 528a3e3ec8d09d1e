//! Construction of credentialed model clients.

use std::sync::Arc;

use crate::completion::CompletionService;
use crate::credentials::ApiKey;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;

/// Builds the embedding provider and completion service for one resolved key.
///
/// The pipeline calls this once per request after resolving the key, so
/// requests carrying different keys never share a client.
pub trait ModelProviders: Send + Sync {
    /// An embedding provider authenticated with `key`.
    fn embedder(&self, key: &ApiKey) -> Result<Arc<dyn EmbeddingProvider>>;

    /// A completion service authenticated with `key`.
    fn completion(&self, key: &ApiKey) -> Result<Arc<dyn CompletionService>>;
}
