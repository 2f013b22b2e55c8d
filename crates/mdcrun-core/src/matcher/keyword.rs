//! Deterministic keyword-overlap matching

use super::{MatchResult, MatchStrategy, StrategyKind};
use crate::error::{Error, Result};
use crate::extract::extract;
use async_trait::async_trait;
use mdcrun_catalog::AutomationDescriptor;
use tracing::debug;

/// Tokens of this many characters or fewer are ignored
const MIN_TOKEN_CHARS: usize = 3;

/// Score at which confidence saturates
const FULL_CONFIDENCE_SCORE: f64 = 5.0;

/// Scores descriptors by how many prompt words appear in their name or description
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordMatcher;

impl KeywordMatcher {
    /// Create a keyword matcher
    pub fn new() -> Self {
        Self
    }

    /// Number of significant prompt tokens found in the descriptor text
    pub fn score(tokens: &[String], descriptor: &AutomationDescriptor) -> usize {
        let haystack = descriptor.search_text();
        tokens
            .iter()
            .filter(|t| t.chars().count() > MIN_TOKEN_CHARS && haystack.contains(t.as_str()))
            .count()
    }

    /// Synchronous matching; the async trait method delegates here.
    pub fn match_prompt(
        &self,
        prompt: &str,
        catalog: &[AutomationDescriptor],
    ) -> Result<MatchResult> {
        let first = catalog.first().ok_or(Error::EmptyCatalog)?;

        let tokens: Vec<String> = prompt
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        // Strictly greater replaces, so ties keep the earliest entry
        let mut best = first;
        let mut best_score = 0;
        for descriptor in catalog {
            let score = Self::score(&tokens, descriptor);
            if score > best_score {
                best = descriptor;
                best_score = score;
            }
        }

        debug!(script = %best.name, score = best_score, "Keyword match");

        Ok(MatchResult {
            descriptor: best.clone(),
            confidence: (best_score as f64 / FULL_CONFIDENCE_SCORE).min(1.0),
            reason: format!("Keyword matching (score: {best_score})"),
            variables: extract(prompt),
            strategy: StrategyKind::Keyword,
        })
    }
}

#[async_trait]
impl MatchStrategy for KeywordMatcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Keyword
    }

    async fn try_match(
        &self,
        prompt: &str,
        catalog: &[AutomationDescriptor],
    ) -> Result<MatchResult> {
        self.match_prompt(prompt, catalog)
    }
}
