//! Cache Registry Module
//!
//! Owns every namespace and routes operations to them by name. This is the
//! single handle collaborators hold; construct one at startup and share it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::{
    CacheStats, CacheStore, Clock, DurableFallback, KeyValueStore, NamespaceConfig,
    SizeEstimator, SystemClock,
};
use crate::error::{CacheError, Result};

/// Default bound on one durable round trip.
pub const DEFAULT_DURABLE_TIMEOUT: Duration = Duration::from_millis(250);

type SharedStore = Arc<Mutex<CacheStore>>;

// == Cache Registry ==
/// Named set of cache stores.
///
/// Each namespace sits behind its own mutex, so mutations within a namespace
/// are serialized while different namespaces proceed independently.
#[derive(Debug)]
pub struct CacheRegistry {
    namespaces: RwLock<HashMap<String, SharedStore>>,
    durable: Option<DurableFallback>,
    clock: Arc<dyn Clock>,
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheRegistry {
    // == Constructor ==
    /// Creates an empty, memory-only registry.
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
            durable: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Backs persistent namespaces with `store`, each call bounded by `timeout`.
    ///
    /// Only namespaces registered after this call pick it up.
    pub fn with_durable(mut self, store: Arc<dyn KeyValueStore>, timeout: Duration) -> Self {
        self.durable = Some(DurableFallback::new(store, timeout));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // == Initialize Namespace ==
    /// Registers a namespace using the default JSON size estimator.
    pub async fn initialize_namespace(&self, config: NamespaceConfig) -> Result<()> {
        self.register(CacheStore::new(config)).await
    }

    /// Registers a namespace with a custom size estimator.
    pub async fn initialize_namespace_with_estimator(
        &self,
        config: NamespaceConfig,
        estimator: SizeEstimator,
    ) -> Result<()> {
        self.register(CacheStore::new(config).with_estimator(estimator))
            .await
    }

    async fn register(&self, store: CacheStore) -> Result<()> {
        store.config().validate()?;

        let mut store = store.with_clock(self.clock.clone());
        if let Some(durable) = &self.durable {
            store = store.with_durable(durable.clone());
        }

        let name = store.name().to_string();
        let mut namespaces = self.namespaces.write().await;
        if namespaces.contains_key(&name) {
            return Err(CacheError::DuplicateNamespace(name));
        }

        let config = store.config();
        info!(
            namespace = %name,
            default_ttl = config.default_ttl,
            max_size = config.max_size,
            strategy = %config.strategy,
            persistent = config.persistent,
            "Registered cache namespace"
        );
        namespaces.insert(name, Arc::new(Mutex::new(store)));
        Ok(())
    }

    async fn lookup(&self, namespace: &str) -> Option<SharedStore> {
        self.namespaces.read().await.get(namespace).cloned()
    }

    async fn lookup_or_warn(&self, namespace: &str, op: &str) -> Option<SharedStore> {
        let store = self.lookup(namespace).await;
        if store.is_none() {
            warn!(namespace, op, "Operation on unregistered cache namespace");
        }
        store
    }

    // == Set ==
    /// Stores a value. Never fails: problems are logged and the call becomes a no-op.
    pub async fn set(&self, namespace: &str, key: &str, value: Value, ttl: Option<u64>) {
        let Some(store) = self.lookup_or_warn(namespace, "set").await else {
            return;
        };
        let result = store.lock().await.set(key, value, ttl).await;
        if let Err(e) = result {
            warn!(namespace, key, error = %e, "Cache set ignored");
        }
    }

    /// Serializes `value` to JSON and stores it.
    pub async fn set_json<T: Serialize>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        ttl: Option<u64>,
    ) {
        match serde_json::to_value(value) {
            Ok(value) => self.set(namespace, key, value, ttl).await,
            Err(e) => warn!(namespace, key, error = %e, "Cache set skipped: value not serializable"),
        }
    }

    // == Get ==
    /// Returns a live value, or `None` on a miss or unregistered namespace.
    pub async fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let store = self.lookup_or_warn(namespace, "get").await?;
        let value = store.lock().await.get(key).await;
        debug!(namespace, key, hit = value.is_some(), "Cache lookup");
        value
    }

    /// Fetches and deserializes a value. A value of the wrong shape reads as `None`.
    pub async fn get_json<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let value = self.get(namespace, key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(namespace, key, error = %e, "Cached value has unexpected shape");
                None
            }
        }
    }

    // == Delete ==
    /// Removes a key. Unknown namespaces and absent keys are no-ops.
    pub async fn del(&self, namespace: &str, key: &str) {
        if let Some(store) = self.lookup_or_warn(namespace, "del").await {
            store.lock().await.del(key).await;
        }
    }

    // == Stats ==
    /// Statistics snapshot for one namespace.
    pub async fn get_stats(&self, namespace: &str) -> Result<CacheStats> {
        let store = self
            .lookup(namespace)
            .await
            .ok_or_else(|| CacheError::UnknownNamespace(namespace.to_string()))?;
        let stats = store.lock().await.stats();
        Ok(stats)
    }

    /// Snapshots for every namespace, ordered by name.
    pub async fn get_all_stats(&self) -> Vec<CacheStats> {
        let mut all = Vec::new();
        for store in self.all_stores().await {
            all.push(store.lock().await.stats());
        }
        all.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        all
    }

    // == Clear ==
    /// Empties one namespace and resets its counters.
    pub async fn clear(&self, namespace: &str) {
        if let Some(store) = self.lookup_or_warn(namespace, "clear").await {
            store.lock().await.clear().await;
            info!(namespace, "Cleared cache namespace");
        }
    }

    /// Empties every namespace and resets all counters.
    pub async fn clear_all(&self) {
        for store in self.all_stores().await {
            store.lock().await.clear().await;
        }
        info!("Cleared all cache namespaces");
    }

    // == Purge Expired ==
    /// Drops expired entries from every namespace. Returns the number removed.
    pub async fn purge_expired(&self) -> usize {
        let mut removed = 0;
        for store in self.all_stores().await {
            removed += store.lock().await.purge_expired();
        }
        removed
    }

    pub async fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.read().await.contains_key(namespace)
    }

    /// Registered namespace names, sorted.
    pub async fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn all_stores(&self) -> Vec<SharedStore> {
        self.namespaces.read().await.values().cloned().collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{EvictionStrategy, ManualClock, MemoryKvStore};
    use serde::Deserialize;
    use serde_json::json;

    async fn registry() -> CacheRegistry {
        let registry = CacheRegistry::new();
        registry
            .initialize_namespace(NamespaceConfig::new("ai-responses", 60, 10_000, EvictionStrategy::Lru))
            .await
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_round_trip_counts_hit() {
        let registry = registry().await;

        registry
            .set("ai-responses", "req-42", json!({"text": "hello"}), Some(60))
            .await;
        let value = registry.get("ai-responses", "req-42").await;

        assert_eq!(value, Some(json!({"text": "hello"})));
        let stats = registry.get_stats("ai-responses").await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_duplicate_namespace_rejected() {
        let registry = registry().await;

        let result = registry
            .initialize_namespace(NamespaceConfig::new("ai-responses", 1, 1, EvictionStrategy::Fifo))
            .await;
        assert!(matches!(result, Err(CacheError::DuplicateNamespace(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let registry = CacheRegistry::new();

        let result = registry
            .initialize_namespace(NamespaceConfig::new("", 1, 1, EvictionStrategy::Fifo))
            .await;
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
        assert!(registry.namespaces().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_namespace_is_harmless() {
        let registry = registry().await;

        registry.set("nope", "k", json!(1), None).await;
        assert!(registry.get("nope", "k").await.is_none());
        registry.del("nope", "k").await;
        registry.clear("nope").await;

        assert!(matches!(
            registry.get_stats("nope").await,
            Err(CacheError::UnknownNamespace(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_key_set_is_ignored() {
        let registry = registry().await;

        registry.set("ai-responses", "", json!(1), None).await;
        let stats = registry.get_stats("ai-responses").await.unwrap();
        assert_eq!(stats.entry_count, 0);
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Reply {
            text: String,
            tokens: u32,
        }

        let registry = registry().await;
        let reply = Reply {
            text: "hi".into(),
            tokens: 3,
        };
        registry.set_json("ai-responses", "r", &reply, None).await;

        assert_eq!(registry.get_json::<Reply>("ai-responses", "r").await, Some(reply));
        assert_eq!(registry.get_json::<Vec<u8>>("ai-responses", "r").await, None);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let registry = registry().await;
        registry
            .initialize_namespace(NamespaceConfig::new("user-profiles", 60, 10_000, EvictionStrategy::Lru))
            .await
            .unwrap();

        registry.set("ai-responses", "shared", json!("ai"), None).await;
        registry.set("user-profiles", "shared", json!("profile"), None).await;

        assert_eq!(registry.get("ai-responses", "shared").await, Some(json!("ai")));
        assert_eq!(registry.get("user-profiles", "shared").await, Some(json!("profile")));

        registry.clear("ai-responses").await;
        assert!(registry.get("ai-responses", "shared").await.is_none());
        assert!(registry.get("user-profiles", "shared").await.is_some());
    }

    #[tokio::test]
    async fn test_all_stats_and_clear_all() {
        let registry = registry().await;
        registry
            .initialize_namespace(NamespaceConfig::new("user-documents", 60, 10_000, EvictionStrategy::Fifo))
            .await
            .unwrap();

        registry.set("ai-responses", "a", json!(1), None).await;
        registry.set("user-documents", "d", json!(2), None).await;
        registry.get("user-documents", "missing").await;

        let all = registry.get_all_stats().await;
        let names: Vec<_> = all.iter().map(|s| s.namespace.as_str()).collect();
        assert_eq!(names, vec!["ai-responses", "user-documents"]);
        assert_eq!(all[1].misses, 1);

        registry.clear_all().await;
        for stats in registry.get_all_stats().await {
            assert_eq!(stats.entry_count, 0);
            assert_eq!(stats.hits + stats.misses, 0);
        }
    }

    #[tokio::test]
    async fn test_purge_expired_with_shared_clock() {
        let clock = ManualClock::new(0);
        let registry = CacheRegistry::new().with_clock(Arc::new(clock.clone()));
        registry
            .initialize_namespace(NamespaceConfig::new("tmpl", 5, 10_000, EvictionStrategy::Fifo))
            .await
            .unwrap();

        registry.set("tmpl", "a", json!(1), None).await;
        registry.set("tmpl", "b", json!(2), Some(60)).await;
        clock.advance_secs(6);

        assert_eq!(registry.purge_expired().await, 1);
        assert_eq!(registry.get_stats("tmpl").await.unwrap().entry_count, 1);
    }

    #[tokio::test]
    async fn test_durable_fallback_survives_new_registry() {
        let kv = Arc::new(MemoryKvStore::new());
        let config = NamespaceConfig::new("legal-content", 3600, 10_000, EvictionStrategy::Fifo).persistent();

        let first = CacheRegistry::new().with_durable(kv.clone(), DEFAULT_DURABLE_TIMEOUT);
        first.initialize_namespace(config.clone()).await.unwrap();
        first.set("legal-content", "intestacy", json!("rules"), None).await;
        drop(first);

        let second = CacheRegistry::new().with_durable(kv.clone(), DEFAULT_DURABLE_TIMEOUT);
        second.initialize_namespace(config).await.unwrap();

        assert_eq!(second.get("legal-content", "intestacy").await, Some(json!("rules")));
        let stats = second.get_stats("legal-content").await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_sets_respect_size_limit() {
        let registry = Arc::new(CacheRegistry::new());
        registry
            .initialize_namespace(NamespaceConfig::new("tmpl", 60, 2_000, EvictionStrategy::Lru))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .set("tmpl", &format!("k{}", i), json!("x".repeat(96)), None)
                    .await;
                registry.get("tmpl", &format!("k{}", i / 2)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = registry.get_stats("tmpl").await.unwrap();
        assert!(stats.total_size <= 2_000);
        assert_eq!(stats.hits + stats.misses, 50);
    }
}
