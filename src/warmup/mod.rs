//! Warm-up Module
//!
//! Startup population of the template, legal-content and validation-rule
//! namespaces from external content providers.

mod coordinator;
mod providers;

pub use coordinator::{WarmupCoordinator, WarmupPlan, WarmupReport, WarmupTask};
pub use providers::{
    FileContentProvider, LegalContentProvider, TemplateProvider, ValidationRuleProvider,
};
