//! Cache Store Module
//!
//! Owns one namespace: entries, TTL expiration, byte accounting, eviction
//! and the optional durable fallback.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{
    json_size_estimator, CacheEntry, CacheStats, Clock, DurableFallback, EvictionCandidate,
    NamespaceConfig, SizeEstimator, StatsCollector, SystemClock,
};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Storage for a single namespace.
pub struct CacheStore {
    config: NamespaceConfig,
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Sum of `size_bytes` over resident entries
    total_size: u64,
    next_sequence: u64,
    /// Performance statistics
    stats: StatsCollector,
    estimator: SizeEstimator,
    durable: Option<DurableFallback>,
    /// Keys whose durable copy could not be written or deleted and must not repopulate
    tombstones: HashSet<String>,
    /// Set when a clear could not purge the durable store
    durable_unpurged: bool,
    /// Keys written durably since that failed purge
    rewritten: HashSet<String>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store using the wall clock and the JSON size estimator.
    pub fn new(config: NamespaceConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            total_size: 0,
            next_sequence: 0,
            stats: StatsCollector::new(),
            estimator: json_size_estimator(),
            durable: None,
            tombstones: HashSet::new(),
            durable_unpurged: false,
            rewritten: HashSet::new(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_estimator(mut self, estimator: SizeEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Attaches a durable store. Ignored unless the namespace is persistent.
    pub fn with_durable(mut self, durable: DurableFallback) -> Self {
        if self.config.persistent {
            self.durable = Some(durable);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &NamespaceConfig {
        &self.config
    }

    fn durable_key(&self, key: &str) -> String {
        format!("{}{}", self.durable_prefix(), key)
    }

    fn durable_prefix(&self) -> String {
        format!("{}:", self.config.name)
    }

    /// Whether the durable copy of `key` is known to be stale.
    fn durable_shadowed(&self, key: &str) -> bool {
        self.tombstones.contains(key) || (self.durable_unpurged && !self.rewritten.contains(key))
    }

    // == Set ==
    /// Stores a value, replacing any existing entry under `key`.
    ///
    /// Evicts per the namespace strategy when the new total would exceed
    /// `max_size`. A value larger than `max_size` on its own is still stored.
    ///
    /// # Arguments
    /// * `key` - Non-empty key
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL in seconds (uses the namespace default if None)
    pub async fn set(&mut self, key: &str, value: Value, ttl: Option<u64>) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey(format!(
                "empty key in namespace '{}'",
                self.config.name
            )));
        }

        let now = self.clock.now_ms();
        let ttl = ttl.unwrap_or(self.config.default_ttl);

        if let Some(durable) = &self.durable {
            if durable.write(&self.durable_key(key), &value, ttl, now).await {
                self.tombstones.remove(key);
                if self.durable_unpurged {
                    self.rewritten.insert(key.to_string());
                }
            } else {
                self.tombstones.insert(key.to_string());
                self.rewritten.remove(key);
            }
        }

        self.admit(key, value, ttl, now, now);
        Ok(())
    }

    /// Inserts an entry created at `created_at`, making room first.
    fn admit(&mut self, key: &str, value: Value, ttl: u64, created_at: u64, now: u64) {
        let size = match (self.estimator)(&value) {
            Ok(size) => size,
            Err(e) => {
                warn!(
                    namespace = %self.config.name,
                    key,
                    error = %e,
                    "Size estimation failed, accounting entry as zero bytes"
                );
                0
            }
        };

        // Replacing releases the old bytes before anything else is measured
        self.remove_entry(key);

        let projected = self.total_size + size;
        if projected > self.config.max_size {
            self.make_room(projected - self.config.max_size, now);
        }

        let entry = CacheEntry::new(value, ttl, size, created_at, self.next_sequence);
        self.next_sequence += 1;
        self.entries.insert(key.to_string(), entry);
        self.total_size += size;

        if self.total_size > self.config.max_size {
            warn!(
                namespace = %self.config.name,
                key,
                size,
                total_size = self.total_size,
                max_size = self.config.max_size,
                "Namespace over its size limit after insert"
            );
        }
    }

    /// Frees at least `needed` bytes if the namespace holds that much.
    ///
    /// Expired entries go first; the eviction strategy covers the remainder.
    fn make_room(&mut self, needed: u64, now: u64) {
        let freed = self.purge_expired_at(now);
        if freed >= needed {
            return;
        }

        let candidates = self
            .entries
            .iter()
            .map(|(key, entry)| EvictionCandidate {
                key: key.clone(),
                created_at: entry.created_at,
                last_accessed_at: entry.last_accessed_at,
                hit_count: entry.hit_count,
                size_bytes: entry.size_bytes,
                sequence: entry.sequence,
            })
            .collect();

        for victim in self
            .config
            .strategy
            .select_victims(candidates, needed - freed)
        {
            if let Some(entry) = self.remove_entry(&victim) {
                self.stats.record_eviction();
                debug!(
                    namespace = %self.config.name,
                    key = %victim,
                    size = entry.size_bytes,
                    strategy = %self.config.strategy,
                    "Evicted entry"
                );
            }
        }
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.total_size = self.total_size.saturating_sub(entry.size_bytes);
        Some(entry)
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are removed and fall through to the durable store
    /// (persistent namespaces only) before counting as a miss.
    pub async fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.record_hit(now);
                self.stats.record_hit();
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.remove_entry(key);
            self.stats.record_expiration();
        }

        if let Some(durable) = self.durable.as_ref().filter(|_| !self.durable_shadowed(key)) {
            if let Some(envelope) = durable.read(&self.durable_key(key), now).await {
                let value = envelope.value.clone();
                self.admit(key, envelope.value, envelope.ttl_secs, envelope.stored_at_ms, now);
                if let Some(entry) = self.entries.get_mut(key) {
                    entry.last_accessed_at = now;
                    debug!(
                        namespace = %self.config.name,
                        key,
                        remaining_ms = entry.ttl_remaining_ms(now),
                        "Repopulated from durable store"
                    );
                }
                self.stats.record_hit();
                return Some(value);
            }
        }

        self.stats.record_miss();
        None
    }

    // == Delete ==
    /// Removes an entry by key, from memory and from the durable store.
    ///
    /// If the durable delete is not confirmed the key is tombstoned, so the
    /// stale copy never repopulates.
    pub async fn del(&mut self, key: &str) {
        self.remove_entry(key);
        if let Some(durable) = &self.durable {
            if durable.remove(&self.durable_key(key)).await {
                self.tombstones.remove(key);
            } else {
                self.tombstones.insert(key.to_string());
            }
            self.rewritten.remove(key);
        }
    }

    // == Clear ==
    /// Drops every entry and resets the counters.
    ///
    /// For persistent namespaces every durable copy under the namespace is
    /// deleted too, including keys already evicted from memory. If the store
    /// does not confirm, nothing written before the clear repopulates.
    pub async fn clear(&mut self) {
        if let Some(durable) = &self.durable {
            let purged = durable.remove_prefix(&self.durable_prefix()).await;
            self.durable_unpurged = !purged;
            self.tombstones.clear();
            self.rewritten.clear();
        }
        self.entries.clear();
        self.total_size = 0;
        self.stats.reset();
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.purge_expired_at(now);
        before - self.entries.len()
    }

    /// Removes expired entries, returning the bytes freed.
    fn purge_expired_at(&mut self, now: u64) -> u64 {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let mut freed = 0;
        for key in expired {
            if let Some(entry) = self.remove_entry(&key) {
                freed += entry.size_bytes;
                self.stats.record_expiration();
            }
        }
        freed
    }

    // == Stats ==
    /// Returns a statistics snapshot over live entries.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        self.stats.snapshot(
            &self.config.name,
            self.config.max_size,
            self.entries.values().filter(|entry| !entry.is_expired_at(now)),
        )
    }

    /// Whether `key` is resident and live. Does not touch counters.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Read-only view of an entry's metadata, expired or not.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Bytes currently accounted to resident entries.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Returns the current number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .field("total_size", &self.total_size)
            .field("stats", &self.stats)
            .field("durable", &self.durable.is_some())
            .finish()
    }
}
