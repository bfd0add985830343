//! Error types for the cache engine and its HTTP surface
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Resolved TTL is not a finite positive duration
    #[error("Cache timeout must be a positive number: {0}")]
    InvalidTtl(String),

    /// An import row carried a key but no record
    #[error("No cache record found when trying to import key: {0}")]
    MissingRecord(String),

    /// Import document does not have the expected shape
    #[error("Invalid import data: {0}")]
    InvalidImport(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Engine was constructed outside a Tokio runtime
    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    /// Key not found in cache (HTTP surface)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data (HTTP surface)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidTtl(_)
            | CacheError::MissingRecord(_)
            | CacheError::InvalidImport(_)
            | CacheError::Serialization(_)
            | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NoRuntime(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = CacheError::NotFound("k".to_string()).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad_ttl = CacheError::InvalidTtl("0".to_string()).into_response();
        assert_eq!(bad_ttl.status(), StatusCode::BAD_REQUEST);

        let runtime = CacheError::NoRuntime("none".to_string()).into_response();
        assert_eq!(runtime.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_record_message_names_key() {
        let err = CacheError::MissingRecord("alpha".to_string());
        assert!(err.to_string().contains("alpha"));
    }
}
