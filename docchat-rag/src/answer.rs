//! Answer generation and extraction.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::completion::{ChatCompletion, ChatMessage, CompletionService};
use crate::error::{RagError, Result};

/// Pull the answer text out of the first choice of `completion`.
///
/// # Errors
///
/// Returns [`RagError::InvalidCompletionResponse`] if there is no choice,
/// the content is missing, the content is not a JSON string (for example a
/// multi-part array), or the string is blank.
pub fn extract_answer(completion: &ChatCompletion) -> Result<String> {
    let choice = completion
        .choices
        .first()
        .ok_or_else(|| RagError::InvalidCompletionResponse("response contained no choices".to_string()))?;

    match &choice.message.content {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.clone()),
        Some(Value::String(_)) => {
            Err(RagError::InvalidCompletionResponse("response content was empty".to_string()))
        }
        Some(other) => Err(RagError::InvalidCompletionResponse(format!(
            "expected plain text content, got {}",
            json_kind(other)
        ))),
        None => Err(RagError::InvalidCompletionResponse("response choice had no content".to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a multi-part array",
        Value::Object(_) => "an object",
    }
}

/// Sends assembled prompts to a [`CompletionService`] and extracts the answer.
#[derive(Clone)]
pub struct Answerer {
    service: Arc<dyn CompletionService>,
}

impl Answerer {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Call the completion service once and return the answer text.
    ///
    /// No retry is attempted on failure.
    pub async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(model = self.service.model(), message_count = messages.len(), "requesting completion");
        let completion = self.service.complete(messages).await?;
        extract_answer(&completion).inspect_err(|e| {
            error!(model = self.service.model(), error = %e, "completion could not be interpreted");
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn completion(body: Value) -> ChatCompletion {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn extracts_first_choice_text() {
        let c = completion(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]
        }));
        assert_eq!(extract_answer(&c).unwrap(), "first");
    }

    #[test]
    fn no_choices_is_invalid() {
        let err = extract_answer(&completion(json!({"choices": []}))).unwrap_err();
        assert!(matches!(err, RagError::InvalidCompletionResponse(_)));
    }

    #[test]
    fn multi_part_content_is_invalid() {
        let c = completion(json!({
            "choices": [{"message": {"content": [{"type": "text", "text": "hi"}]}}]
        }));
        let err = extract_answer(&c).unwrap_err();
        assert!(err.to_string().contains("multi-part"));
    }

    #[test]
    fn null_or_blank_content_is_invalid() {
        let null = completion(json!({"choices": [{"message": {"content": null}}]}));
        assert!(extract_answer(&null).is_err());
        assert!(extract_answer(&ChatCompletion::from_text("   ")).is_err());
    }
}
