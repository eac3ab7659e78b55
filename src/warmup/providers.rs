//! Warm-up Content Providers
//!
//! Collaborators that produce the content loaded into caches at startup.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::generate_cache_key;
use crate::error::{CacheError, Result};

/// Supplies will templates per jurisdiction and template type.
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    async fn fetch_template(&self, jurisdiction: &str, template_type: &str) -> Result<Value>;
}

/// Supplies static legal content by content type.
#[async_trait]
pub trait LegalContentProvider: Send + Sync {
    async fn fetch_legal_content(&self, content_type: &str) -> Result<Value>;
}

/// Supplies the validation rule set of a jurisdiction.
#[async_trait]
pub trait ValidationRuleProvider: Send + Sync {
    async fn fetch_validation_rules(&self, jurisdiction: &str) -> Result<Value>;
}

// == File Content Provider ==
/// Reads warm-up content from JSON files under a root directory:
///
/// - `templates/{jurisdiction}/{template_type}.json`
/// - `legal-content/{content_type}.json`
/// - `validation-rules/{jurisdiction}.json`
///
/// Path segments are normalized the same way cache keys are, so identifiers
/// cannot escape the root.
#[derive(Debug, Clone)]
pub struct FileContentProvider {
    root: PathBuf,
}

impl FileContentProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read_json(&self, path: &Path) -> Result<Value> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CacheError::Fetch(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| CacheError::Fetch(format!("{}: invalid JSON: {}", path.display(), e)))
    }
}

fn segment(part: &str) -> String {
    generate_cache_key([part])
}

#[async_trait]
impl TemplateProvider for FileContentProvider {
    async fn fetch_template(&self, jurisdiction: &str, template_type: &str) -> Result<Value> {
        let path = self
            .root
            .join("templates")
            .join(segment(jurisdiction))
            .join(format!("{}.json", segment(template_type)));
        self.read_json(&path).await
    }
}

#[async_trait]
impl LegalContentProvider for FileContentProvider {
    async fn fetch_legal_content(&self, content_type: &str) -> Result<Value> {
        let path = self
            .root
            .join("legal-content")
            .join(format!("{}.json", segment(content_type)));
        self.read_json(&path).await
    }
}

#[async_trait]
impl ValidationRuleProvider for FileContentProvider {
    async fn fetch_validation_rules(&self, jurisdiction: &str) -> Result<Value> {
        let path = self
            .root
            .join("validation-rules")
            .join(format!("{}.json", segment(jurisdiction)));
        self.read_json(&path).await
    }
}
