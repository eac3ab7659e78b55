//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Response body for GET /cache/:namespace/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub namespace: String,
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /cache/:namespace/:key
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    pub namespace: String,
    pub key: String,
}

impl SetResponse {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        let (namespace, key) = (namespace.into(), key.into());
        Self {
            message: format!("Key '{}' set in '{}'", key, namespace),
            namespace,
            key,
        }
    }
}

/// Response body for DELETE /cache/:namespace/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    pub namespace: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        let (namespace, key) = (namespace.into(), key.into());
        Self {
            message: format!("Key '{}' deleted from '{}'", key, namespace),
            namespace,
            key,
        }
    }
}

/// Response body for DELETE /cache/:namespace and DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Namespaces that were emptied
    pub cleared: Vec<String>,
}

impl ClearResponse {
    pub fn new(cleared: Vec<String>) -> Self {
        Self {
            message: format!("Cleared {} namespace(s)", cleared.len()),
            cleared,
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Hit rate across all namespaces
    pub overall_hit_rate: f64,
    pub namespaces: Vec<CacheStats>,
}

impl StatsResponse {
    pub fn new(namespaces: Vec<CacheStats>) -> Self {
        let hits: u64 = namespaces.iter().map(|s| s.hits).sum();
        let misses: u64 = namespaces.iter().map(|s| s.misses).sum();
        let total_requests = hits + misses;
        let overall_hit_rate = if total_requests > 0 {
            hits as f64 / total_requests as f64
        } else {
            0.0
        };
        Self {
            overall_hit_rate,
            namespaces,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Number of registered namespaces
    pub namespaces: usize,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(namespaces: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            namespaces,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
