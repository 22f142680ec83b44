//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP front end.
///
/// An expired key and a missing key both surface as [`CacheError::NotFound`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key absent, or present but already past its TTL
    #[error("Key not found: {0}")]
    NotFound(String),

    /// No live entry left to pop
    #[error("Cache is empty")]
    Empty,

    /// A single value does not fit even in an empty cache
    #[error("Value too large: size {size} exceeds maxsize {maxsize}")]
    ValueTooLarge { size: usize, maxsize: usize },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A saved cache state could not be restored
    #[error("Invalid cache state: {0}")]
    InvalidState(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Builds a `NotFound` error from any debuggable key.
    pub fn not_found<K: std::fmt::Debug + ?Sized>(key: &K) -> Self {
        CacheError::NotFound(format!("{:?}", key))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) | CacheError::Empty => StatusCode::NOT_FOUND,
            CacheError::ValueTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CacheError::InvalidRequest(_) | CacheError::InvalidState(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_formats_key() {
        let err = CacheError::not_found("alpha");
        assert_eq!(err, CacheError::NotFound("\"alpha\"".to_string()));
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn test_value_too_large_message() {
        let err = CacheError::ValueTooLarge { size: 12, maxsize: 10 };
        assert_eq!(
            err.to_string(),
            "Value too large: size 12 exceeds maxsize 10"
        );
    }

    #[test]
    fn test_error_status_codes() {
        let cases = vec![
            (CacheError::NotFound("k".to_string()), StatusCode::NOT_FOUND),
            (CacheError::Empty, StatusCode::NOT_FOUND),
            (
                CacheError::ValueTooLarge { size: 2, maxsize: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                CacheError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CacheError::InvalidState("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CacheError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
