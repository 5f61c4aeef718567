//! Error types for the report engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Generation Error Enum ==
/// Unified error type for document generation.
///
/// Cache corruption and cache write failures are deliberately absent: the
/// result cache recovers from both locally and only records them in its stats.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Requested kind has no registered template
    #[error("Unknown template kind: {0}")]
    UnknownKind(String),

    /// Template constructor rejected at registration time
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Template configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A content builder hook failed
    #[error("Build failed: {0}")]
    Build(String),

    /// The rendering backend failed
    #[error("Render failed: {0}")]
    Render(String),

    /// Filesystem failure outside the cache
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        let status = match &self {
            GenerationError::UnknownKind(_) => StatusCode::NOT_FOUND,
            GenerationError::InvalidConfig(_) | GenerationError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            GenerationError::Build(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GenerationError::InvalidTemplate(_)
            | GenerationError::Render(_)
            | GenerationError::Io(_)
            | GenerationError::Serialization(_)
            | GenerationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the report engine.
pub type Result<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_maps_to_not_found() {
        let response = GenerationError::UnknownKind("invoice".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_build_failure_maps_to_unprocessable() {
        let response = GenerationError::Build("missing blocks".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_error_message_includes_kind() {
        let err = GenerationError::UnknownKind("invoice".to_string());
        assert_eq!(err.to_string(), "Unknown template kind: invoice");
    }
}
