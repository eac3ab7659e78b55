//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last successful read, or creation time if never read (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Time to live in seconds
    pub ttl: u64,
    /// Number of hits served since insertion
    pub hit_count: u64,
    /// Estimated size at insertion time
    pub size_bytes: u64,
    /// Insertion order within the namespace, used to break eviction ties
    pub sequence: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now_ms`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - TTL in seconds
    /// * `size_bytes` - Size reported by the namespace's estimator
    /// * `now_ms` - Current time in Unix milliseconds
    /// * `sequence` - Insertion sequence number
    pub fn new(value: Value, ttl: u64, size_bytes: u64, now_ms: u64, sequence: u64) -> Self {
        Self {
            value,
            created_at: now_ms,
            last_accessed_at: now_ms,
            ttl,
            hit_count: 0,
            size_bytes,
            sequence,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// Boundary condition: an entry is expired only when strictly more than
    /// `ttl` seconds have elapsed since creation. At exactly
    /// `created_at + ttl` the entry is still live.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at) > self.ttl_ms()
    }

    /// Absolute expiration instant (Unix milliseconds).
    pub fn expires_at(&self) -> u64 {
        self.created_at.saturating_add(self.ttl_ms())
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at().saturating_sub(now_ms)
    }

    // == Record Hit ==
    /// Marks a successful read at `now_ms`.
    pub fn record_hit(&mut self, now_ms: u64) {
        self.hit_count += 1;
        self.last_accessed_at = now_ms;
    }

    fn ttl_ms(&self) -> u64 {
        self.ttl.saturating_mul(1000)
    }
}
