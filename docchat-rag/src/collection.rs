//! Mapping from conversation-thread identifiers to collection names.
//!
//! The name is the trimmed thread identifier with every whitespace character
//! replaced by `_`. Runs of whitespace are not collapsed, so `"my  thread"`
//! maps to `my__thread`. Two identifiers that sanitize to the same string
//! share a collection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// A sanitized, non-empty collection name derived from a thread identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionName(String);

impl CollectionName {
    /// Derive the collection name for a raw thread identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] if the identifier is empty or
    /// whitespace only.
    pub fn from_thread_id(thread_id: &str) -> Result<Self> {
        let sanitized = sanitize_thread_id(thread_id);
        if sanitized.is_empty() {
            return Err(RagError::validation("threadId is required and must be a non-empty string"));
        }
        Ok(Self(sanitized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trim `thread_id` and replace each remaining whitespace character with `_`.
pub fn sanitize_thread_id(thread_id: &str) -> String {
    thread_id.trim().chars().map(|c| if c.is_whitespace() { '_' } else { c }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_each_whitespace_character() {
        assert_eq!(sanitize_thread_id("my thread"), "my_thread");
        assert_eq!(sanitize_thread_id("my  thread"), "my__thread");
        assert_eq!(sanitize_thread_id("a\tb\nc"), "a_b_c");
    }

    #[test]
    fn trims_before_replacing() {
        assert_eq!(sanitize_thread_id("  abc 123 \n"), "abc_123");
    }

    #[test]
    fn sanitizing_twice_is_a_no_op() {
        let once = sanitize_thread_id(" x y\u{00A0}z ");
        assert_eq!(sanitize_thread_id(&once), once);
    }

    #[test]
    fn rejects_blank_thread_ids() {
        assert!(matches!(CollectionName::from_thread_id(""), Err(RagError::Validation(_))));
        assert!(matches!(CollectionName::from_thread_id(" \t "), Err(RagError::Validation(_))));
    }

    #[test]
    fn displays_the_sanitized_name() {
        let name = CollectionName::from_thread_id("abc 123").unwrap();
        assert_eq!(name.to_string(), "abc_123");
        assert_eq!(name.as_str(), "abc_123");
    }
}
