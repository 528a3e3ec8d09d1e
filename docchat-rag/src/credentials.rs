//! API key resolution.
//!
//! Keys are resolved per request and passed explicitly to the providers that
//! need them. The process environment is read once at startup to fill
//! [`Credentials`] and is never written.

use std::fmt;

use crate::error::{RagError, Result};

/// Environment variable holding the primary credential.
pub const PRIMARY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable holding the fallback credential.
pub const FALLBACK_ENV: &str = "LLM_API_KEY";

/// A resolved, non-empty API key. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, returning `None` for empty or whitespace-only input.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Credentials known to the process, in resolution order after the caller's own key.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    primary: Option<ApiKey>,
    fallback: Option<ApiKey>,
}

impl Credentials {
    pub fn new(primary: Option<ApiKey>, fallback: Option<ApiKey>) -> Self {
        Self { primary, fallback }
    }

    /// Read [`PRIMARY_ENV`] and [`FALLBACK_ENV`].
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().and_then(ApiKey::new);
        Self { primary: read(PRIMARY_ENV), fallback: read(FALLBACK_ENV) }
    }

    /// Resolve the key for one request: caller-supplied, then primary, then fallback.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::MissingCredential`] when none of the three is set.
    pub fn resolve(&self, supplied: Option<&str>) -> Result<ApiKey> {
        supplied
            .and_then(ApiKey::new)
            .or_else(|| self.primary.clone())
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| RagError::MissingCredential { primary_env: PRIMARY_ENV.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Option<ApiKey> {
        ApiKey::new(s)
    }

    #[test]
    fn caller_key_wins() {
        let creds = Credentials::new(key("primary"), key("fallback"));
        assert_eq!(creds.resolve(Some("mine")).unwrap().expose(), "mine");
    }

    #[test]
    fn blank_caller_key_falls_through_to_primary_then_fallback() {
        let creds = Credentials::new(key("primary"), key("fallback"));
        assert_eq!(creds.resolve(Some("  ")).unwrap().expose(), "primary");

        let creds = Credentials::new(None, key("fallback"));
        assert_eq!(creds.resolve(None).unwrap().expose(), "fallback");
    }

    #[test]
    fn nothing_resolvable_is_missing_credential() {
        let err = Credentials::default().resolve(None).unwrap_err();
        assert!(matches!(err, RagError::MissingCredential { .. }));
    }

    #[test]
    fn debug_does_not_leak_the_key() {
        let rendered = format!("{:?}", ApiKey::new("sk-secret").unwrap());
        assert!(!rendered.contains("sk-secret"));
    }
}
