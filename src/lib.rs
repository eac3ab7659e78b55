//! Estate Cache - multi-namespace caching engine for the estate-planning backend
//!
//! Per-namespace TTL, size-bounded eviction (FIFO/LRU/LFU), statistics,
//! an optional durable fallback tier and startup warm-up.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;
pub mod warmup;

pub use api::AppState;
pub use cache::{CacheRegistry, CacheStats, EvictionStrategy, NamespaceConfig};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
