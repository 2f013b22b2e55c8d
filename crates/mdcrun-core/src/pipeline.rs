//! Prompt pipeline: catalog → match → execute → record.

use crate::bridge::{ExecutionBridge, ExecutionOutcome};
use crate::error::{Error, Result};
use crate::history::{ExecutionRecord, HistoryStore};
use crate::matcher::{FallbackMatcher, MatchResult};
use chrono::Utc;
use mdcrun_catalog::{AutomationDescriptor, CatalogSource};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Match plus execution outcome for one prompt
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Selected automation
    pub matched: MatchResult,
    /// Bridge outcome
    pub outcome: ExecutionOutcome,
}

/// Wires catalog, matcher, bridge and history together
pub struct Automator {
    catalog: Box<dyn CatalogSource>,
    matcher: FallbackMatcher,
    bridge: Box<dyn ExecutionBridge>,
    history: Option<HistoryStore>,
}

impl Automator {
    /// Create a pipeline without history
    pub fn new(
        catalog: Box<dyn CatalogSource>,
        matcher: FallbackMatcher,
        bridge: Box<dyn ExecutionBridge>,
    ) -> Self {
        Self {
            catalog,
            matcher,
            bridge,
            history: None,
        }
    }

    /// Record executions in `history`
    #[must_use]
    pub fn with_history(mut self, history: HistoryStore) -> Self {
        self.history = Some(history);
        self
    }

    /// Load the current catalog
    pub async fn catalog(&self) -> Vec<AutomationDescriptor> {
        self.catalog.list_descriptors().await
    }

    /// Match `prompt` without executing anything
    #[instrument(skip(self, prompt))]
    pub async fn analyze(&self, prompt: &str) -> Result<MatchResult> {
        let catalog = self.catalog().await;
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        self.matcher.match_prompt(prompt, &catalog).await
    }

    /// Match `prompt`, execute the selected script and record the run
    #[instrument(skip(self, prompt))]
    pub async fn run(&self, prompt: &str) -> Result<RunReport> {
        let matched = self.analyze(prompt).await?;
        info!(
            script = %matched.descriptor.name,
            strategy = %matched.strategy,
            confidence = matched.confidence,
            "Executing automation"
        );

        let outcome = self
            .bridge
            .execute(&matched.descriptor.path, &matched.variables)
            .await;

        if let Some(history) = &self.history {
            let record = ExecutionRecord {
                timestamp: Utc::now(),
                prompt: prompt.to_string(),
                script_name: matched.descriptor.name.clone(),
                confidence: matched.confidence,
                outcome: outcome.clone(),
            };
            if let Err(e) = history.append(&record) {
                warn!(error = %e, "Failed to record execution history");
            }
        }

        Ok(RunReport { matched, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ExecutionErrorKind, MockExecutionBridge};
    use crate::matcher::{LlmMatcher, StrategyKind};
    use mdcrun_catalog::StaticCatalog;
    use mdcrun_llm::{Error as LlmError, MockProvider};
    use std::sync::Arc;

    fn catalog() -> StaticCatalog {
        StaticCatalog(vec![
            AutomationDescriptor::local("a.mdc", "mdc_files/a.mdc", "check broken links"),
            AutomationDescriptor::local("b.mdc", "mdc_files/b.mdc", "validate emails"),
        ])
    }

    fn ok_outcome(script: &str) -> ExecutionOutcome {
        ExecutionOutcome {
            success: true,
            output: "done".to_string(),
            error: String::new(),
            script: script.to_string(),
            error_kind: None,
            exit_code: Some(0),
        }
    }

    #[tokio::test]
    async fn test_run_passes_path_and_variables() {
        let mut bridge = MockExecutionBridge::new();
        bridge
            .expect_execute()
            .withf(|path, vars| {
                path.to_string() == "mdc_files/a.mdc"
                    && vars.get("asset_id").map(String::as_str) == Some("123456")
            })
            .times(1)
            .returning(|path, _| ok_outcome(path));

        let dir = tempfile::tempdir().unwrap();
        let history = HistoryStore::new(dir.path().join("history.jsonl"));
        let automator = Automator::new(
            Box::new(catalog()),
            FallbackMatcher::keyword_only(),
            Box::new(bridge),
        )
        .with_history(history.clone());

        let report = automator.run("check broken links on asset/123456").await.unwrap();
        assert!(report.outcome.success);
        assert_eq!(report.matched.descriptor.name, "a.mdc");

        let recorded = history.recent(5).unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].script_name, "a.mdc");
    }

    #[tokio::test]
    async fn test_failed_execution_is_reported_not_raised() {
        let mut bridge = MockExecutionBridge::new();
        bridge.expect_execute().returning(|path, _| {
            ExecutionOutcome::failed(path, ExecutionErrorKind::Timeout, "Execution timeout (300s)")
        });

        let automator = Automator::new(
            Box::new(catalog()),
            FallbackMatcher::keyword_only(),
            Box::new(bridge),
        );
        let report = automator.run("validate emails").await.unwrap();
        assert!(!report.outcome.success);
        assert_eq!(report.outcome.error_kind, Some(ExecutionErrorKind::Timeout));
        assert_eq!(report.matched.descriptor.name, "b.mdc");
    }

    #[tokio::test]
    async fn test_analyze_does_not_execute() {
        let mut bridge = MockExecutionBridge::new();
        bridge.expect_execute().times(0);

        let provider = MockProvider::new();
        provider.push_reply(r#"{"mdc_index": 1, "confidence": 0.9, "reason": "emails"}"#);
        let matcher =
            FallbackMatcher::with_primary(Box::new(LlmMatcher::new(Arc::new(provider))));

        let automator = Automator::new(Box::new(catalog()), matcher, Box::new(bridge));
        let result = automator.analyze("validate emails").await.unwrap();
        assert_eq!(result.descriptor.name, "b.mdc");
        assert_eq!(result.strategy, StrategyKind::Llm);
    }

    #[tokio::test]
    async fn test_llm_failure_falls_back() {
        let provider = MockProvider::new();
        provider.push_error(LlmError::Api("connection refused".to_string()));
        let matcher =
            FallbackMatcher::with_primary(Box::new(LlmMatcher::new(Arc::new(provider))));

        let automator = Automator::new(
            Box::new(catalog()),
            matcher,
            Box::new(MockExecutionBridge::new()),
        );
        let result = automator.analyze("check broken links").await.unwrap();
        assert_eq!(result.strategy, StrategyKind::Keyword);
        assert_eq!(result.descriptor.name, "a.mdc");
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let automator = Automator::new(
            Box::new(StaticCatalog::default()),
            FallbackMatcher::keyword_only(),
            Box::new(MockExecutionBridge::new()),
        );
        assert!(matches!(automator.run("anything").await, Err(Error::EmptyCatalog)));
    }
}
