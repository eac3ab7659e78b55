//! Warm-up Coordinator
//!
//! Populates designated namespaces once at startup. Every task is independent:
//! a failed fetch is logged and the rest carry on.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::cache::{
    generate_cache_key, CacheRegistry, LEGAL_CONTENT, VALIDATION_RULES, WILL_TEMPLATES,
};
use crate::error::{CacheError, Result};
use crate::warmup::{LegalContentProvider, TemplateProvider, ValidationRuleProvider};

// == Warm-up Plan ==
/// Which identifiers to warm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmupPlan {
    pub jurisdictions: Vec<String>,
    pub template_types: Vec<String>,
    pub content_types: Vec<String>,
}

/// Outcome counts of a warm-up run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarmupReport {
    pub succeeded: usize,
    pub failed: usize,
}

// == Warm-up Task ==
/// One fetch-and-store unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmupTask {
    Template {
        jurisdiction: String,
        template_type: String,
    },
    LegalContent {
        content_type: String,
    },
    ValidationRules {
        jurisdiction: String,
    },
}

impl WarmupTask {
    pub fn namespace(&self) -> &'static str {
        match self {
            WarmupTask::Template { .. } => WILL_TEMPLATES,
            WarmupTask::LegalContent { .. } => LEGAL_CONTENT,
            WarmupTask::ValidationRules { .. } => VALIDATION_RULES,
        }
    }

    pub fn key(&self) -> String {
        match self {
            WarmupTask::Template {
                jurisdiction,
                template_type,
            } => generate_cache_key([jurisdiction, template_type]),
            WarmupTask::LegalContent { content_type } => generate_cache_key([content_type]),
            WarmupTask::ValidationRules { jurisdiction } => generate_cache_key([jurisdiction]),
        }
    }

    /// Fetches and stores. Fails if the value has nowhere to land.
    async fn run(&self, registry: &CacheRegistry, providers: &Providers) -> Result<()> {
        let namespace = self.namespace();
        if !registry.has_namespace(namespace).await {
            return Err(CacheError::UnknownNamespace(namespace.to_string()));
        }
        let key = self.key();
        if key.is_empty() {
            return Err(CacheError::InvalidKey(format!("empty warm-up key for {}", namespace)));
        }

        let value = self.fetch(providers).await?;
        registry.set(namespace, &key, value, None).await;
        Ok(())
    }

    async fn fetch(&self, providers: &Providers) -> Result<Value> {
        match self {
            WarmupTask::Template {
                jurisdiction,
                template_type,
            } => {
                providers
                    .templates
                    .as_ref()
                    .ok_or_else(|| unavailable("template"))?
                    .fetch_template(jurisdiction, template_type)
                    .await
            }
            WarmupTask::LegalContent { content_type } => {
                providers
                    .legal_content
                    .as_ref()
                    .ok_or_else(|| unavailable("legal content"))?
                    .fetch_legal_content(content_type)
                    .await
            }
            WarmupTask::ValidationRules { jurisdiction } => {
                providers
                    .validation_rules
                    .as_ref()
                    .ok_or_else(|| unavailable("validation rule"))?
                    .fetch_validation_rules(jurisdiction)
                    .await
            }
        }
    }
}

impl fmt::Display for WarmupTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace(), self.key())
    }
}

fn unavailable(kind: &str) -> CacheError {
    CacheError::Fetch(format!("no {} provider configured", kind))
}

#[derive(Clone, Default)]
struct Providers {
    templates: Option<Arc<dyn TemplateProvider>>,
    legal_content: Option<Arc<dyn LegalContentProvider>>,
    validation_rules: Option<Arc<dyn ValidationRuleProvider>>,
}

// == Warm-up Coordinator ==
/// Runs the warm-up plan against the registry.
pub struct WarmupCoordinator {
    registry: Arc<CacheRegistry>,
    plan: WarmupPlan,
    providers: Providers,
}

impl WarmupCoordinator {
    pub fn new(registry: Arc<CacheRegistry>, plan: WarmupPlan) -> Self {
        Self {
            registry,
            plan,
            providers: Providers::default(),
        }
    }

    pub fn with_templates(mut self, provider: Arc<dyn TemplateProvider>) -> Self {
        self.providers.templates = Some(provider);
        self
    }

    pub fn with_legal_content(mut self, provider: Arc<dyn LegalContentProvider>) -> Self {
        self.providers.legal_content = Some(provider);
        self
    }

    pub fn with_validation_rules(mut self, provider: Arc<dyn ValidationRuleProvider>) -> Self {
        self.providers.validation_rules = Some(provider);
        self
    }

    /// Every jurisdiction × template type, every content type, and every
    /// jurisdiction's rule set.
    pub fn tasks(&self) -> Vec<WarmupTask> {
        let mut tasks = Vec::new();
        for jurisdiction in &self.plan.jurisdictions {
            for template_type in &self.plan.template_types {
                tasks.push(WarmupTask::Template {
                    jurisdiction: jurisdiction.clone(),
                    template_type: template_type.clone(),
                });
            }
        }
        for content_type in &self.plan.content_types {
            tasks.push(WarmupTask::LegalContent {
                content_type: content_type.clone(),
            });
        }
        for jurisdiction in &self.plan.jurisdictions {
            tasks.push(WarmupTask::ValidationRules {
                jurisdiction: jurisdiction.clone(),
            });
        }
        tasks
    }

    // == Warm Up ==
    /// Runs all tasks concurrently and waits for them. Never fails.
    pub async fn warm_up(&self) -> WarmupReport {
        let tasks = self.tasks();
        info!(tasks = tasks.len(), "Starting cache warm-up");

        let mut set = JoinSet::new();
        for task in tasks {
            let registry = self.registry.clone();
            let providers = self.providers.clone();
            set.spawn(async move {
                let outcome = task.run(&registry, &providers).await;
                (task, outcome)
            });
        }

        let mut report = WarmupReport::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.succeeded += 1,
                Ok((task, Err(e))) => {
                    warn!(task = %task, error = %e, "Warm-up task failed");
                    report.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "Warm-up task panicked");
                    report.failed += 1;
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "Cache warm-up finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::default_namespaces;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubProvider;

    #[async_trait]
    impl TemplateProvider for StubProvider {
        async fn fetch_template(&self, jurisdiction: &str, template_type: &str) -> Result<Value> {
            if jurisdiction == "broken" {
                return Err(CacheError::Fetch("upstream down".into()));
            }
            Ok(json!({"jurisdiction": jurisdiction, "type": template_type}))
        }
    }

    #[async_trait]
    impl LegalContentProvider for StubProvider {
        async fn fetch_legal_content(&self, content_type: &str) -> Result<Value> {
            if content_type == "panics" {
                panic!("provider bug");
            }
            Ok(json!(content_type))
        }
    }

    #[async_trait]
    impl ValidationRuleProvider for StubProvider {
        async fn fetch_validation_rules(&self, jurisdiction: &str) -> Result<Value> {
            Ok(json!({"jurisdiction": jurisdiction, "witnesses": 2}))
        }
    }

    async fn registry() -> Arc<CacheRegistry> {
        let registry = CacheRegistry::new();
        for config in default_namespaces() {
            registry.initialize_namespace(config).await.unwrap();
        }
        Arc::new(registry)
    }

    fn plan(jurisdictions: &[&str], template_types: &[&str], content_types: &[&str]) -> WarmupPlan {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        WarmupPlan {
            jurisdictions: owned(jurisdictions),
            template_types: owned(template_types),
            content_types: owned(content_types),
        }
    }

    fn full(registry: Arc<CacheRegistry>, plan: WarmupPlan) -> WarmupCoordinator {
        let provider = Arc::new(StubProvider);
        WarmupCoordinator::new(registry, plan)
            .with_templates(provider.clone())
            .with_legal_content(provider.clone())
            .with_validation_rules(provider)
    }

    #[test]
    fn test_task_keys() {
        let task = WarmupTask::Template {
            jurisdiction: "US-CA".into(),
            template_type: "Simple".into(),
        };
        assert_eq!(task.namespace(), WILL_TEMPLATES);
        assert_eq!(task.key(), "us-ca:simple");
        assert_eq!(task.to_string(), "will-templates/us-ca:simple");
    }

    #[tokio::test]
    async fn test_task_expansion() {
        let coordinator = full(registry().await, plan(&["a", "b"], &["x", "y", "z"], &["faq"]));
        let tasks = coordinator.tasks();

        assert_eq!(tasks.len(), 2 * 3 + 1 + 2);
        assert!(tasks.contains(&WarmupTask::ValidationRules {
            jurisdiction: "b".into()
        }));
    }

    #[tokio::test]
    async fn test_warm_up_populates_namespaces() {
        let registry = registry().await;
        let report = full(registry.clone(), plan(&["us-ca"], &["simple"], &["glossary"]))
            .warm_up()
            .await;

        assert_eq!(report, WarmupReport { succeeded: 3, failed: 0 });
        assert_eq!(
            registry.get(WILL_TEMPLATES, "us-ca:simple").await,
            Some(json!({"jurisdiction": "us-ca", "type": "simple"}))
        );
        assert_eq!(registry.get(LEGAL_CONTENT, "glossary").await, Some(json!("glossary")));
        assert!(registry.get(VALIDATION_RULES, "us-ca").await.is_some());
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let registry = registry().await;
        let report = full(
            registry.clone(),
            plan(&["broken", "uk"], &["simple"], &["panics", "faq"]),
        )
        .warm_up()
        .await;

        // broken template + panicking content fail; the other four succeed
        assert_eq!(report, WarmupReport { succeeded: 4, failed: 2 });
        assert!(registry.get(WILL_TEMPLATES, "uk:simple").await.is_some());
        assert!(registry.get(WILL_TEMPLATES, "broken:simple").await.is_none());
        assert!(registry.get(LEGAL_CONTENT, "faq").await.is_some());
    }

    #[tokio::test]
    async fn test_missing_provider_counts_as_failure() {
        let registry = registry().await;
        let coordinator = WarmupCoordinator::new(registry.clone(), plan(&["uk"], &["simple"], &[]))
            .with_validation_rules(Arc::new(StubProvider));

        let report = coordinator.warm_up().await;
        assert_eq!(report, WarmupReport { succeeded: 1, failed: 1 });
    }

    #[tokio::test]
    async fn test_unregistered_namespace_counts_as_failure() {
        let registry = CacheRegistry::new();
        registry
            .initialize_namespace(
                default_namespaces()
                    .into_iter()
                    .find(|n| n.name == LEGAL_CONTENT)
                    .unwrap(),
            )
            .await
            .unwrap();

        let report = full(Arc::new(registry), plan(&["us-ca"], &["simple"], &["faq"]))
            .warm_up()
            .await;

        // only legal-content exists; the template and rule tasks have nowhere to go
        assert_eq!(report, WarmupReport { succeeded: 1, failed: 2 });
    }

    #[tokio::test]
    async fn test_blank_identifier_counts_as_failure() {
        let report = full(registry().await, plan(&[], &[], &["  "])).warm_up().await;
        assert_eq!(report, WarmupReport { succeeded: 0, failed: 1 });
    }

    #[tokio::test]
    async fn test_empty_plan_is_noop() {
        let report = full(registry().await, WarmupPlan::default()).warm_up().await;
        assert_eq!(report, WarmupReport::default());
    }
}
