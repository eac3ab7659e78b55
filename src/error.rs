//! Error types for the caching engine
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
/// Unified error type for the caching engine.
///
/// Registry entry points never hand these to callers of `get`/`set`/`del`;
/// they are logged and degraded at the call site.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not present in the namespace
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key was empty or otherwise unusable
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Namespace was never registered
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    /// Namespace name already registered
    #[error("Namespace already registered: {0}")]
    DuplicateNamespace(String),

    /// Namespace configuration rejected at registration
    #[error("Invalid namespace config: {0}")]
    InvalidConfig(String),

    /// Size estimator could not measure a value
    #[error("Size estimation failed: {0}")]
    SizeEstimation(String),

    /// Durable backing store failed
    #[error("Durable store error: {0}")]
    Durable(#[from] KvError),

    /// Durable round trip exceeded its time bound
    #[error("Durable store timed out after {0} ms")]
    DurableTimeout(u64),

    /// Value could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Warm-up collaborator failed to produce content
    #[error("Warm-up fetch failed: {0}")]
    Fetch(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Durable Store Error ==
/// Errors raised by `KeyValueStore` implementations.
#[derive(Error, Debug)]
pub enum KvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Envelope encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) | CacheError::UnknownNamespace(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidKey(_)
            | CacheError::InvalidConfig(_)
            | CacheError::DuplicateNamespace(_)
            | CacheError::Serialization(_) => StatusCode::BAD_REQUEST,
            CacheError::Durable(_) | CacheError::DurableTimeout(_) | CacheError::Fetch(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CacheError::SizeEstimation(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching engine.
pub type Result<T> = std::result::Result<T, CacheError>;
