//! Namespace Configuration
//!
//! Static settings each cache namespace is registered with.

use serde::{Deserialize, Serialize};

use crate::cache::EvictionStrategy;
use crate::error::{CacheError, Result};

// == Namespace Config ==
/// Settings for one independently bounded cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Unique namespace name
    pub name: String,
    /// TTL in seconds for entries set without an explicit TTL
    pub default_ttl: u64,
    /// Byte limit for the sum of live entry sizes
    pub max_size: u64,
    /// Victim selection policy
    pub strategy: EvictionStrategy,
    /// Whether entries are also written to the durable store
    #[serde(default)]
    pub persistent: bool,
}

impl NamespaceConfig {
    pub fn new(
        name: impl Into<String>,
        default_ttl: u64,
        max_size: u64,
        strategy: EvictionStrategy,
    ) -> Self {
        Self {
            name: name.into(),
            default_ttl,
            max_size,
            strategy,
            persistent: false,
        }
    }

    /// Marks the namespace as backed by the durable store.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Rejects configurations that cannot hold anything.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CacheError::InvalidConfig(
                "namespace name cannot be empty".to_string(),
            ));
        }
        if self.name.contains(':') {
            return Err(CacheError::InvalidConfig(format!(
                "namespace '{}' cannot contain ':'",
                self.name
            )));
        }
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(format!(
                "namespace '{}' needs a max_size above zero",
                self.name
            )));
        }
        Ok(())
    }
}

// == Default Namespaces ==
pub const WILL_TEMPLATES: &str = "will-templates";
pub const VALIDATION_RESULTS: &str = "validation-results";
pub const AI_RESPONSES: &str = "ai-responses";
pub const USER_PROFILES: &str = "user-profiles";
pub const USER_DOCUMENTS: &str = "user-documents";
pub const LEGAL_CONTENT: &str = "legal-content";
pub const VALIDATION_RULES: &str = "validation-rules";

const MB: u64 = 1024 * 1024;

/// Namespaces the application registers at startup.
pub fn default_namespaces() -> Vec<NamespaceConfig> {
    vec![
        NamespaceConfig::new(WILL_TEMPLATES, 60 * 60, 10 * MB, EvictionStrategy::Lru),
        NamespaceConfig::new(VALIDATION_RESULTS, 30 * 60, 5 * MB, EvictionStrategy::Lfu),
        NamespaceConfig::new(AI_RESPONSES, 15 * 60, 20 * MB, EvictionStrategy::Lru),
        NamespaceConfig::new(USER_PROFILES, 10 * 60, 2 * MB, EvictionStrategy::Lru),
        NamespaceConfig::new(USER_DOCUMENTS, 5 * 60, 10 * MB, EvictionStrategy::Fifo),
        NamespaceConfig::new(LEGAL_CONTENT, 24 * 60 * 60, 5 * MB, EvictionStrategy::Fifo)
            .persistent(),
        NamespaceConfig::new(VALIDATION_RULES, 24 * 60 * 60, 2 * MB, EvictionStrategy::Fifo)
            .persistent(),
    ]
}
