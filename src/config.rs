//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{default_namespaces, NamespaceConfig};
use crate::warmup::WarmupPlan;

const DEFAULT_JURISDICTIONS: &[&str] = &["us-ca", "us-ny", "us-tx", "us-fl", "uk-eng"];
const DEFAULT_TEMPLATE_TYPES: &[&str] = &["simple-will", "living-will", "pour-over-will"];
const DEFAULT_CONTENT_TYPES: &[&str] = &["glossary", "faq", "intestacy-overview"];

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Expiry sweep interval in seconds, 0 disables the sweep
    pub sweep_interval: u64,
    /// Directory of the file-backed durable store; memory-only when unset
    pub durable_dir: Option<PathBuf>,
    /// Bound on each durable store round trip, in milliseconds
    pub durable_timeout_ms: u64,
    /// Directory warm-up content is read from; warm-up is skipped when unset
    pub warmup_content_dir: Option<PathBuf>,
    pub warmup: WarmupPlan,
    /// Namespaces registered at startup
    pub namespaces: Vec<NamespaceConfig>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    /// - `DURABLE_DIR` - Durable store directory (default: unset)
    /// - `DURABLE_TIMEOUT_MS` - Durable round-trip bound (default: 250)
    /// - `WARMUP_CONTENT_DIR` - Warm-up content directory (default: unset)
    /// - `WARMUP_JURISDICTIONS`, `WARMUP_TEMPLATE_TYPES`, `WARMUP_CONTENT_TYPES` -
    ///   comma separated warm-up identifiers
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let path = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        let list = |name: &str, fallback: Vec<String>| {
            lookup(name).map(|v| split_list(&v)).unwrap_or(fallback)
        };

        Self {
            server_port: parsed(&lookup, "SERVER_PORT").unwrap_or(defaults.server_port),
            sweep_interval: parsed(&lookup, "SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            durable_dir: path("DURABLE_DIR"),
            durable_timeout_ms: parsed(&lookup, "DURABLE_TIMEOUT_MS")
                .unwrap_or(defaults.durable_timeout_ms),
            warmup_content_dir: path("WARMUP_CONTENT_DIR"),
            warmup: WarmupPlan {
                jurisdictions: list("WARMUP_JURISDICTIONS", defaults.warmup.jurisdictions),
                template_types: list("WARMUP_TEMPLATE_TYPES", defaults.warmup.template_types),
                content_types: list("WARMUP_CONTENT_TYPES", defaults.warmup.content_types),
            },
            namespaces: defaults.namespaces,
        }
    }

    pub fn durable_timeout(&self) -> Duration {
        Duration::from_millis(self.durable_timeout_ms)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.trim().parse().ok())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            sweep_interval: 60,
            durable_dir: None,
            durable_timeout_ms: 250,
            warmup_content_dir: None,
            warmup: WarmupPlan {
                jurisdictions: owned(DEFAULT_JURISDICTIONS),
                template_types: owned(DEFAULT_TEMPLATE_TYPES),
                content_types: owned(DEFAULT_CONTENT_TYPES),
            },
            namespaces: default_namespaces(),
        }
    }
}
