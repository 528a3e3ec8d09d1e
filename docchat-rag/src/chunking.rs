//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`]: splits on paragraphs, lines, sentences, words and
//!   finally characters, then merges the pieces into overlapping windows
//! - [`FixedSizeChunker`]: plain character windows with overlap
//!
//! Sizes are measured in characters, never bytes, so multi-byte text is
//! never split inside a code point. Both chunkers are deterministic.
//! [`chunker_for`] picks one from [`RagConfig::chunk_strategy`].

use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::{ChunkStrategy, RagConfig};
use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Every returned chunk carries a copy of the parent document's metadata.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no non-whitespace text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Split every document with `chunker`, preserving document order.
pub fn split_documents(chunker: &dyn Chunker, documents: &[Document]) -> Vec<Chunk> {
    documents.iter().flat_map(|document| chunker.chunk(document)).collect()
}

/// Build the chunker selected by `config`, sized from it.
pub fn chunker_for(config: &RagConfig) -> Arc<dyn Chunker> {
    match config.chunk_strategy {
        ChunkStrategy::Recursive => Arc::new(RecursiveChunker::from_config(config)),
        ChunkStrategy::Fixed => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)),
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn chunk_from(document: &Document, text: String) -> Chunk {
    Chunk { text, metadata: document.metadata.clone() }
}

/// Splits text into fixed-size character windows with configurable overlap.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(256, 50);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size: chunk_size.max(1), chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = document.text.chars().collect();
        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chunk_from(document, chars[start..end].iter().collect()));
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Separators tried in order, coarsest first. The empty separator splits
/// into single characters and always applies.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Splits text hierarchically, then merges pieces into overlapping windows.
///
/// The first separator that occurs in the text is used to split it. Pieces
/// no longer than `chunk_size` are merged greedily into windows; when a
/// window is emitted, pieces are dropped from its front until at most
/// `chunk_overlap` characters remain, and those carry into the next window.
/// Pieces longer than `chunk_size` are split again with the next separator.
/// Emitted chunks are trimmed and never exceed `chunk_size` characters.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size: chunk_size.max(1), chunk_overlap }
    }

    /// Create a chunker with the sizes from `config`.
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    fn split_text(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let pieces = if separator.is_empty() {
            split_chars(text)
        } else {
            split_keeping_separator(text, separator)
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) <= self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge_pieces(&pending));
                pending.clear();
            }
            if remaining.is_empty() {
                push_trimmed(&mut chunks, piece.to_string());
            } else {
                chunks.extend(self.split_text(piece, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge_pieces(&pending));
        }

        chunks
    }

    /// Merge pieces (each at most `chunk_size` long) into overlapping windows.
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, window.iter().copied().collect());
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let Some(front) = window.pop_front() else { break };
                    total -= char_len(front);
                }
            }
            window.push_back(piece);
            total += len;
        }

        if !window.is_empty() {
            push_trimmed(&mut chunks, window.iter().copied().collect());
        }

        chunks
    }
}

fn push_trimmed(chunks: &mut Vec<String>, text: String) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

fn split_chars(text: &str) -> Vec<&str> {
    text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect()
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        self.split_text(&document.text, &SEPARATORS)
            .into_iter()
            .map(|text| chunk_from(document, text))
            .collect()
    }
}
