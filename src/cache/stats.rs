//! Cache Statistics Module
//!
//! Tracks per-namespace hit/miss counters and builds statistics snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;

// == Stats Collector ==
/// Running counters for one namespace.
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted to make room
    pub evictions: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expirations: u64,
}

impl StatsCollector {
    // == Constructor ==
    /// Creates a new collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // == Snapshot ==
    /// Builds a point-in-time view combining counters with the live entries.
    pub fn snapshot<'a>(
        &self,
        namespace: &str,
        max_size: u64,
        entries: impl Iterator<Item = &'a CacheEntry>,
    ) -> CacheStats {
        let mut total_size = 0u64;
        let mut entry_count = 0usize;
        let mut oldest: Option<u64> = None;
        let mut newest: Option<u64> = None;

        for entry in entries {
            total_size += entry.size_bytes;
            entry_count += 1;
            oldest = Some(oldest.map_or(entry.created_at, |o| o.min(entry.created_at)));
            newest = Some(newest.map_or(entry.created_at, |n| n.max(entry.created_at)));
        }

        CacheStats {
            namespace: namespace.to_string(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate(),
            evictions: self.evictions,
            expirations: self.expirations,
            total_size,
            max_size,
            entry_count,
            oldest_entry_timestamp: oldest.and_then(to_datetime),
            newest_entry_timestamp: newest.and_then(to_datetime),
        }
    }
}

fn to_datetime(ms: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms as i64)
}

// == Cache Stats ==
/// Statistics snapshot for one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub namespace: String,
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses), 0 when there were no reads
    pub hit_rate: f64,
    pub evictions: u64,
    pub expirations: u64,
    /// Sum of live entry sizes in bytes
    pub total_size: u64,
    /// Configured byte limit
    pub max_size: u64,
    pub entry_count: usize,
    pub oldest_entry_timestamp: Option<DateTime<Utc>>,
    pub newest_entry_timestamp: Option<DateTime<Utc>>,
}
