//! Chat-completion messages and the service trait that answers them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A completion response as returned by the service, before extraction.
///
/// `content` is kept as raw JSON so that structured or multi-part payloads
/// can be detected and rejected rather than failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: CompletionMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<Value>,
}

impl ChatCompletion {
    /// A single-choice completion whose content is `text`. Mostly for tests and mocks.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![CompletionChoice {
                message: CompletionMessage { content: Some(Value::String(text.into())) },
            }],
        }
    }
}

/// A chat-completion backend bound to one model.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send `messages` and return the raw completion.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion>;

    /// Return the model identifier used for every call.
    fn model(&self) -> &str;
}
