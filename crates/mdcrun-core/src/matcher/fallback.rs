//! Try-then-fallback composition of match strategies

use super::{KeywordMatcher, MatchResult, MatchStrategy};
use crate::error::{Error, Result};
use mdcrun_catalog::AutomationDescriptor;
use tracing::{instrument, warn};

/// Runs an optional primary strategy, falling back to keyword matching.
///
/// Failures of the primary never reach the caller; the only error returned
/// is [`Error::EmptyCatalog`].
pub struct FallbackMatcher {
    primary: Option<Box<dyn MatchStrategy>>,
    fallback: KeywordMatcher,
}

impl FallbackMatcher {
    /// Keyword matching only
    pub fn keyword_only() -> Self {
        Self {
            primary: None,
            fallback: KeywordMatcher::new(),
        }
    }

    /// Try `primary` first
    pub fn with_primary(primary: Box<dyn MatchStrategy>) -> Self {
        Self {
            primary: Some(primary),
            fallback: KeywordMatcher::new(),
        }
    }

    /// Whether a primary strategy is configured
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Select the best automation for `prompt`
    #[instrument(skip(self, prompt, catalog), fields(entries = catalog.len()))]
    pub async fn match_prompt(
        &self,
        prompt: &str,
        catalog: &[AutomationDescriptor],
    ) -> Result<MatchResult> {
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        if let Some(primary) = &self.primary {
            match primary.try_match(prompt, catalog).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!(strategy = %primary.kind(), error = %e, "AI matching failed, using fallback");
                }
            }
        }

        self.fallback.match_prompt(prompt, catalog)
    }
}

impl Default for FallbackMatcher {
    fn default() -> Self {
        Self::keyword_only()
    }
}
