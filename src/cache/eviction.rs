//! Eviction Policy Module
//!
//! Ranks live entries of a namespace and picks victims when space is needed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// == Eviction Strategy ==
/// Closed set of eviction policies, chosen once per namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvictionStrategy {
    /// Oldest insertion first
    Fifo,
    /// Least recently accessed first
    Lru,
    /// Fewest hits first
    Lfu,
}

/// Per-entry metadata the policy ranks on.
#[derive(Debug, Clone)]
pub struct EvictionCandidate {
    pub key: String,
    pub created_at: u64,
    pub last_accessed_at: u64,
    pub hit_count: u64,
    pub size_bytes: u64,
    pub sequence: u64,
}

impl EvictionStrategy {
    fn rank(&self, candidate: &EvictionCandidate) -> u64 {
        match self {
            EvictionStrategy::Fifo => candidate.created_at,
            EvictionStrategy::Lru => candidate.last_accessed_at,
            EvictionStrategy::Lfu => candidate.hit_count,
        }
    }

    // == Select Victims ==
    /// Returns the keys to evict, in eviction order, so that their combined
    /// size reaches `needed`.
    ///
    /// Stops at the first victim that crosses the threshold. If every
    /// candidate together frees less than `needed`, all of them are returned.
    pub fn select_victims(&self, mut candidates: Vec<EvictionCandidate>, needed: u64) -> Vec<String> {
        if needed == 0 {
            return Vec::new();
        }

        candidates.sort_by_key(|c| (self.rank(c), c.sequence));

        let mut freed = 0u64;
        let mut victims = Vec::new();
        for candidate in candidates {
            if freed >= needed {
                break;
            }
            freed += candidate.size_bytes;
            victims.push(candidate.key);
        }
        victims
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionStrategy::Fifo => "FIFO",
            EvictionStrategy::Lru => "LRU",
            EvictionStrategy::Lfu => "LFU",
        };
        f.write_str(name)
    }
}

impl FromStr for EvictionStrategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FIFO" => Ok(EvictionStrategy::Fifo),
            "LRU" => Ok(EvictionStrategy::Lru),
            "LFU" => Ok(EvictionStrategy::Lfu),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown eviction strategy '{}'",
                other
            ))),
        }
    }
}
