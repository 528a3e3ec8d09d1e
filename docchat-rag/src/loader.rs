//! Source loading.
//!
//! A [`DocumentLoader`] turns one source identifier into one or more
//! [`Document`]s. [`load_sources`] runs a loader over a batch and partitions
//! the identifiers into loaded documents and missing sources, leaving the
//! abort decision to the caller.
//!
//! [`FileLoader`] reads PDFs page by page with `lopdf` and everything else
//! as UTF-8 text.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::document::Document;

/// Why a single source could not be loaded.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source does not exist.
    #[error("source not found: {0}")]
    NotFound(String),

    /// The source exists but could not be read or parsed.
    #[error("source unreadable ({source_id}): {message}")]
    Unreadable {
        /// The identifier that failed.
        source_id: String,
        /// A description of the failure.
        message: String,
    },
}

/// Loads a single source into documents.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load `source` into one or more documents.
    ///
    /// Sources with no extractable text yield an empty `Vec`.
    async fn load(&self, source: &str) -> Result<Vec<Document>, SourceError>;
}

/// Result of loading a batch of sources.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Documents from every readable source, in request order.
    pub documents: Vec<Document>,
    /// Identifiers that were missing or unreadable, in request order.
    pub missing: Vec<String>,
}

impl LoadOutcome {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Load every non-blank identifier in `sources` with `loader`.
///
/// Blank identifiers are skipped silently; every other identifier reaches the
/// loader unchanged. A failing source is recorded in [`LoadOutcome::missing`]
/// and does not stop the remaining sources from loading.
pub async fn load_sources<S: AsRef<str>>(loader: &dyn DocumentLoader, sources: &[S]) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();
    for source in sources {
        let source = source.as_ref();
        if source.trim().is_empty() {
            continue;
        }
        match loader.load(source).await {
            Ok(documents) => {
                debug!(source, document_count = documents.len(), "loaded source");
                outcome.documents.extend(documents);
            }
            Err(e) => {
                warn!(source, error = %e, "source could not be loaded");
                outcome.missing.push(source.to_string());
            }
        }
    }
    outcome
}

/// Loads sources from the local filesystem.
///
/// Files with a `.pdf` extension produce one document per non-blank page
/// (zero-based `page` metadata). Other files are read as UTF-8 text into a
/// single document with `page` 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

#[async_trait]
impl DocumentLoader for FileLoader {
    async fn load(&self, source: &str) -> Result<Vec<Document>, SourceError> {
        let path = Path::new(source);
        let unreadable = |message: String| SourceError::Unreadable { source_id: source.to_string(), message };

        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(unreadable("not a regular file".to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(source.to_string()));
            }
            Err(e) => return Err(unreadable(e.to_string())),
        }

        if is_pdf(path) {
            let bytes = tokio::fs::read(path).await.map_err(|e| unreadable(e.to_string()))?;
            let pages = tokio::task::spawn_blocking(move || extract_pdf_pages(&bytes))
                .await
                .map_err(|e| unreadable(format!("task join error: {e}")))?
                .map_err(unreadable)?;

            Ok(pages
                .into_iter()
                .filter(|(_, text)| !text.trim().is_empty())
                .map(|(page, text)| Document::new(text, source, page))
                .collect())
        } else {
            let text = tokio::fs::read_to_string(path).await.map_err(|e| unreadable(e.to_string()))?;
            if text.trim().is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![Document::new(text, source, 0)])
        }
    }
}

/// Extract `(zero-based page, text)` pairs from PDF bytes.
///
/// Pages whose text cannot be extracted are skipped; the whole file fails
/// only when it cannot be parsed or no page yields text.
fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<(u32, String)>, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| format!("failed to parse PDF: {e}"))?;
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err("PDF has no pages".to_string());
    }

    let mut pages = Vec::with_capacity(page_numbers.len());
    for number in page_numbers {
        match doc.extract_text(&[number]) {
            Ok(text) => pages.push((number.saturating_sub(1), text)),
            Err(e) => warn!(page = number, error = %e, "skipping PDF page without extractable text"),
        }
    }

    if pages.is_empty() {
        return Err("no page text could be extracted".to_string());
    }
    Ok(pages)
}
