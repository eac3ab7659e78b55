//! Cache Module
//!
//! Multi-namespace in-memory caching with TTL expiration, pluggable eviction
//! and an optional durable fallback.

mod clock;
mod durable;
mod entry;
mod eviction;
mod keys;
mod namespace;
mod registry;
mod size;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use durable::{DurableEnvelope, DurableFallback, FileKvStore, KeyValueStore, MemoryKvStore};
pub use entry::CacheEntry;
pub use eviction::{EvictionCandidate, EvictionStrategy};
pub use keys::{generate_cache_key, hash_serializable, hash_validation_data, KEY_SEPARATOR};
pub use namespace::{
    default_namespaces, NamespaceConfig, AI_RESPONSES, LEGAL_CONTENT, USER_DOCUMENTS,
    USER_PROFILES, VALIDATION_RESULTS, VALIDATION_RULES, WILL_TEMPLATES,
};
pub use registry::{CacheRegistry, DEFAULT_DURABLE_TIMEOUT};
pub use size::{estimate_json_size, json_size_estimator, SizeEstimator};
pub use stats::{CacheStats, StatsCollector};
pub use store::CacheStore;
