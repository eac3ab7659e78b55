//! API Handlers
//!
//! HTTP request handlers for each admin endpoint. Every handler goes through
//! the registry, so the HTTP surface obeys the same rules as in-process callers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheRegistry, CacheStats};
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<CacheRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<CacheRegistry>) -> Self {
        Self { registry }
    }

    async fn require_namespace(&self, namespace: &str) -> Result<()> {
        if self.registry.has_namespace(namespace).await {
            Ok(())
        } else {
            Err(CacheError::UnknownNamespace(namespace.to_string()))
        }
    }
}

/// Handler for PUT /cache/:namespace/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate(&key) {
        return Err(CacheError::InvalidKey(error_msg));
    }
    state.require_namespace(&namespace).await?;

    state.registry.set(&namespace, &key, req.value, req.ttl).await;

    Ok(Json(SetResponse::new(namespace, key)))
}

/// Handler for GET /cache/:namespace/:key
///
/// Misses and expired entries both answer 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    state.require_namespace(&namespace).await?;

    match state.registry.get(&namespace, &key).await {
        Some(value) => Ok(Json(GetResponse::new(namespace, key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/:namespace/:key
///
/// Deleting an absent key is not an error.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    state.require_namespace(&namespace).await?;

    state.registry.del(&namespace, &key).await;

    Ok(Json(DeleteResponse::new(namespace, key)))
}

/// Handler for DELETE /cache/:namespace
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<ClearResponse>> {
    state.require_namespace(&namespace).await?;

    state.registry.clear(&namespace).await;

    Ok(Json(ClearResponse::new(vec![namespace])))
}

/// Handler for DELETE /cache
pub async fn clear_all_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.registry.clear_all().await;
    Json(ClearResponse::new(state.registry.namespaces().await))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.registry.get_all_stats().await))
}

/// Handler for GET /stats/:namespace
pub async fn namespace_stats_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<CacheStats>> {
    Ok(Json(state.registry.get_stats(&namespace).await?))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.registry.namespaces().await.len()))
}
