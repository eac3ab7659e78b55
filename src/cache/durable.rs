//! Durable Store Module
//!
//! Optional persistent backing for namespaces flagged `persistent`.
//!
//! Values travel through the store as a self-describing JSON envelope that
//! carries its own write timestamp and TTL, so expiry can be judged without
//! the in-memory entry that wrote it.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CacheError, KvError};

// == Key Value Store Trait ==
/// Flat-keyed durable storage with best-effort TTL support.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Stores `value` under `key`. `ttl_secs` is a hint for stores with native expiry.
    async fn set_with_ttl(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), KvError>;

    /// Returns the stored value, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Removes every key starting with `prefix`. Returns how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, KvError>;
}

// == Durable Envelope ==
/// Serialized form of a persisted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurableEnvelope {
    pub value: Value,
    /// Write time (Unix milliseconds)
    pub stored_at_ms: u64,
    pub ttl_secs: u64,
}

impl DurableEnvelope {
    pub fn new(value: Value, stored_at_ms: u64, ttl_secs: u64) -> Self {
        Self {
            value,
            stored_at_ms,
            ttl_secs,
        }
    }

    /// Same boundary rule as in-memory entries: live at exactly `stored_at + ttl`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.stored_at_ms) > self.ttl_secs.saturating_mul(1000)
    }

    pub fn encode(&self) -> Result<String, KvError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, KvError> {
        Ok(serde_json::from_str(raw)?)
    }
}

// == Durable Fallback ==
/// Best-effort, time-bounded wrapper around a `KeyValueStore`.
///
/// Every failure is logged and reported as "absent"; nothing propagates.
#[derive(Debug, Clone)]
pub struct DurableFallback {
    store: Arc<dyn KeyValueStore>,
    timeout: Duration,
}

impl DurableFallback {
    pub fn new(store: Arc<dyn KeyValueStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, KvError>>,
    {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::DurableTimeout(self.timeout.as_millis() as u64)),
        }
    }

    /// Persists `value` under `key` with the given TTL. Returns false if the
    /// store did not confirm the write.
    pub async fn write(&self, key: &str, value: &Value, ttl_secs: u64, now_ms: u64) -> bool {
        let encoded = match DurableEnvelope::new(value.clone(), now_ms, ttl_secs).encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key, error = %e, "Skipping durable write: envelope encoding failed");
                return false;
            }
        };

        match self
            .bounded(self.store.set_with_ttl(key, encoded, ttl_secs))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Durable write failed, continuing memory-only");
                false
            }
        }
    }

    /// Reads a live envelope for `key`, if the store has one.
    pub async fn read(&self, key: &str, now_ms: u64) -> Option<DurableEnvelope> {
        let raw = match self.bounded(self.store.get(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Durable read failed, treating as miss");
                return None;
            }
        };

        let envelope = match DurableEnvelope::decode(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable durable entry");
                self.remove(key).await;
                return None;
            }
        };

        if envelope.is_expired_at(now_ms) {
            debug!(key, "Durable entry expired");
            self.remove(key).await;
            return None;
        }

        Some(envelope)
    }

    /// Deletes `key` from the store. Returns false if the store did not confirm.
    pub async fn remove(&self, key: &str) -> bool {
        match self.bounded(self.store.delete(key)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Durable delete failed");
                false
            }
        }
    }

    /// Deletes every key under `prefix`. Returns false if the store did not confirm.
    pub async fn remove_prefix(&self, prefix: &str) -> bool {
        match self.bounded(self.store.delete_prefix(prefix)).await {
            Ok(removed) => {
                debug!(prefix, removed, "Durable prefix deleted");
                true
            }
            Err(e) => {
                warn!(prefix, error = %e, "Durable prefix delete failed");
                false
            }
        }
    }
}

// == Memory Store ==
/// Process-local `KeyValueStore`. Survives registry rebuilds when shared via `Arc`.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.lock().map(|data| data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_data<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> Result<T, KvError> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| KvError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(f(&mut data))
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn set_with_ttl(&self, key: &str, value: String, _ttl_secs: u64) -> Result<(), KvError> {
        self.with_data(|data| {
            data.insert(key.to_string(), value);
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        self.with_data(|data| data.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.with_data(|data| {
            data.remove(key);
        })
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, KvError> {
        self.with_data(|data| {
            let before = data.len();
            data.retain(|key, _| !key.starts_with(prefix));
            before - data.len()
        })
    }
}

// == File Store ==
/// `KeyValueStore` keeping one JSON file per key in a directory.
///
/// File names are the hex-encoded key, so any key is filesystem safe.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, KvError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key)))
    }

    /// Recovers the key from a file name written by `path_for`.
    fn key_for(file_name: &str) -> Option<String> {
        let encoded = file_name.strip_suffix(".json")?;
        String::from_utf8(hex::decode(encoded).ok()?).ok()
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn set_with_ttl(&self, key: &str, value: String, _ttl_secs: u64) -> Result<(), KvError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, KvError> {
        let mut removed = 0;
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            let Some(key) = name.to_str().and_then(Self::key_for) else {
                continue;
            };
            if key.starts_with(prefix) {
                self.delete(&key).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn set_with_ttl(&self, _: &str, _: String, _: u64) -> Result<(), KvError> {
            Err(KvError::Unavailable("offline".into()))
        }
        async fn get(&self, _: &str) -> Result<Option<String>, KvError> {
            Err(KvError::Unavailable("offline".into()))
        }
        async fn delete(&self, _: &str) -> Result<(), KvError> {
            Err(KvError::Unavailable("offline".into()))
        }
        async fn delete_prefix(&self, _: &str) -> Result<usize, KvError> {
            Err(KvError::Unavailable("offline".into()))
        }
    }

    #[derive(Debug)]
    struct StalledStore;

    #[async_trait]
    impl KeyValueStore for StalledStore {
        async fn set_with_ttl(&self, _: &str, _: String, _: u64) -> Result<(), KvError> {
            std::future::pending().await
        }
        async fn get(&self, _: &str) -> Result<Option<String>, KvError> {
            std::future::pending().await
        }
        async fn delete(&self, _: &str) -> Result<(), KvError> {
            std::future::pending().await
        }
        async fn delete_prefix(&self, _: &str) -> Result<usize, KvError> {
            std::future::pending().await
        }
    }

    fn fallback(store: Arc<dyn KeyValueStore>) -> DurableFallback {
        DurableFallback::new(store, Duration::from_millis(50))
    }

    #[test]
    fn test_envelope_expiry_boundary() {
        let envelope = DurableEnvelope::new(json!(1), 1_000, 5);
        assert!(!envelope.is_expired_at(6_000));
        assert!(envelope.is_expired_at(6_001));
    }

    #[test]
    fn test_envelope_is_self_describing() {
        let raw = DurableEnvelope::new(json!({"a": 1}), 42, 60).encode().unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["stored_at_ms"], 42);
        assert_eq!(parsed["ttl_secs"], 60);
        assert_eq!(parsed["value"]["a"], 1);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryKvStore::new();
        store.set_with_ttl("k", "v".into(), 10).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::open(dir.path().join("durable")).await.unwrap();

        store
            .set_with_ttl("legal-content:intestacy/rules", "{}".into(), 10)
            .await
            .unwrap();
        assert_eq!(
            store.get("legal-content:intestacy/rules").await.unwrap(),
            Some("{}".to_string())
        );

        store.delete("legal-content:intestacy/rules").await.unwrap();
        assert_eq!(store.get("legal-content:intestacy/rules").await.unwrap(), None);
        // Deleting twice is fine
        store.delete("legal-content:intestacy/rules").await.unwrap();
    }

    #[tokio::test]
    async fn test_fallback_returns_live_envelope() {
        let store = Arc::new(MemoryKvStore::new());
        let durable = fallback(store.clone());

        durable.write("ns:k", &json!("v"), 10, 1_000).await;
        let envelope = durable.read("ns:k", 5_000).await.unwrap();
        assert_eq!(envelope.value, json!("v"));
        assert_eq!(envelope.stored_at_ms, 1_000);
    }

    #[tokio::test]
    async fn test_fallback_drops_expired_envelope() {
        let store = Arc::new(MemoryKvStore::new());
        let durable = fallback(store.clone());

        durable.write("ns:k", &json!("v"), 1, 0).await;
        assert!(durable.read("ns:k", 1_001).await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_discards_garbage() {
        let store = Arc::new(MemoryKvStore::new());
        store.set_with_ttl("ns:k", "not json".into(), 10).await.unwrap();

        let durable = fallback(store.clone());
        assert!(durable.read("ns:k", 0).await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_swallows_store_errors() {
        let durable = fallback(Arc::new(BrokenStore));

        assert!(!durable.write("ns:k", &json!(1), 10, 0).await);
        assert!(durable.read("ns:k", 0).await.is_none());
        assert!(!durable.remove("ns:k").await);
        assert!(!durable.remove_prefix("ns:").await);
    }

    #[tokio::test]
    async fn test_fallback_times_out() {
        let durable = fallback(Arc::new(StalledStore));

        durable.write("ns:k", &json!(1), 10, 0).await;
        assert!(durable.read("ns:k", 0).await.is_none());
        assert!(!durable.remove("ns:k").await);
    }

    #[tokio::test]
    async fn test_memory_store_delete_prefix() {
        let store = MemoryKvStore::new();
        for key in ["legal-content:a", "legal-content:b", "validation-rules:a"] {
            store.set_with_ttl(key, "{}".into(), 10).await.unwrap();
        }

        assert_eq!(store.delete_prefix("legal-content:").await.unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("validation-rules:a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_store_delete_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKvStore::open(dir.path()).await.unwrap();
        for key in ["legal-content:a", "legal-content:b", "validation-rules:a"] {
            store.set_with_ttl(key, "{}".into(), 10).await.unwrap();
        }
        tokio::fs::write(dir.path().join("stray.txt"), "x").await.unwrap();

        assert_eq!(store.delete_prefix("legal-content:").await.unwrap(), 2);
        assert_eq!(store.get("legal-content:a").await.unwrap(), None);
        assert!(store.get("validation-rules:a").await.unwrap().is_some());
    }
}
