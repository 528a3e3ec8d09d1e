use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docchat_rag::RagError;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;

/// An error returned from an HTTP handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be read as the expected JSON shape.
    #[error("{0}")]
    BadRequest(String),

    /// A pipeline failure; `action` names what was being attempted.
    #[error("{action}: {source}")]
    Pipeline {
        action: &'static str,
        #[source]
        source: RagError,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// Adapter for `map_err` that tags a pipeline error with the failed action.
    pub fn during(action: &'static str) -> impl FnOnce(RagError) -> Self {
        move |source| ApiError::Pipeline { action, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline { source, .. } => match source {
                RagError::Validation(_)
                | RagError::MissingCredential { .. }
                | RagError::MissingSources { .. }
                | RagError::EmptyResult(_) => StatusCode::BAD_REQUEST,
                RagError::CollectionNotFound { .. } => StatusCode::NOT_FOUND,
                RagError::InvalidCompletionResponse(_) => StatusCode::BAD_GATEWAY,
                RagError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                // upstream service failures and configuration errors
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> Value {
        let ApiError::Pipeline { action, source } = self else {
            return json!({ "message": self.to_string() });
        };
        match source {
            RagError::MissingSources { missing } => {
                json!({ "message": source.to_string(), "missingPaths": missing })
            }
            RagError::CollectionNotFound { collection } => {
                json!({ "message": source.to_string(), "vectorCollection": collection })
            }
            _ if source.is_upstream() || matches!(source, RagError::ConfigError(_)) => {
                json!({ "message": action, "detail": source.to_string() })
            }
            _ => json!({ "message": source.to_string() }),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn pipeline(source: RagError) -> ApiError {
        ApiError::during("Failed to create embeddings")(source)
    }

    #[test]
    fn client_errors_map_to_400() {
        for source in [
            RagError::Validation("threadId is required".into()),
            RagError::MissingCredential { primary_env: "OPENAI_API_KEY".into() },
            RagError::EmptyResult("nothing".into()),
            RagError::MissingSources { missing: vec!["a.pdf".into()] },
        ] {
            assert_eq!(pipeline(source).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn missing_sources_list_the_paths() {
        let err = pipeline(RagError::MissingSources { missing: vec!["a.pdf".into(), "b.pdf".into()] });
        assert_eq!(err.body()["missingPaths"], json!(["a.pdf", "b.pdf"]));
    }

    #[test]
    fn unknown_collection_is_404_with_name() {
        let err = pipeline(RagError::CollectionNotFound { collection: "abc_123".into() });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.body()["vectorCollection"], "abc_123");
    }

    #[test]
    fn upstream_failures_carry_detail() {
        for source in [
            RagError::EmbeddingError { provider: "OpenAI".into(), message: "boom".into() },
            RagError::VectorStoreError { backend: "qdrant".into(), message: "boom".into() },
            RagError::CompletionError { provider: "OpenAI".into(), message: "boom".into() },
            RagError::ConfigError("boom".into()),
        ] {
            let err = pipeline(source);
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = err.body();
            assert_eq!(body["message"], "Failed to create embeddings");
            assert!(body["detail"].as_str().unwrap().contains("boom"));
        }
    }

    #[test]
    fn client_errors_carry_no_detail() {
        let body = pipeline(RagError::Validation("threadId is required".into())).body();
        assert_eq!(body["message"], "threadId is required");
        assert!(body.get("detail").is_none());
    }

    #[test]
    fn completion_shape_and_timeouts_are_gateway_errors() {
        assert_eq!(pipeline(RagError::InvalidCompletionResponse("null".into())).status(), StatusCode::BAD_GATEWAY);
        let timeout = RagError::Timeout { service: "completion".into(), after: Duration::from_secs(1) };
        assert_eq!(pipeline(timeout).status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
