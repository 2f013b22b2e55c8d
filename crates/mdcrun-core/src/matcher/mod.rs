//! Prompt-to-automation matching.
//!
//! Two strategies share the [`MatchStrategy`] seam:
//!
//! - [`LlmMatcher`]: asks a chat model to pick a catalog index
//! - [`KeywordMatcher`]: deterministic keyword overlap
//!
//! [`FallbackMatcher`] composes them: the model is tried first when one is
//! configured, and any failure drops to keyword matching.

mod fallback;
mod keyword;
mod llm;

pub use fallback::FallbackMatcher;
pub use keyword::KeywordMatcher;
pub use llm::{build_system_prompt, LlmMatcher, LlmMatcherConfig};

use crate::error::Result;
use crate::extract::Variables;
use async_trait::async_trait;
use mdcrun_catalog::AutomationDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which strategy produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Language model selection
    Llm,
    /// Keyword overlap
    Keyword,
}

impl StrategyKind {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Keyword => "keyword",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The selected automation plus everything needed to run it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Selected descriptor, always a member of the catalog matched against
    pub descriptor: AutomationDescriptor,
    /// Heuristic score in `[0, 1]`
    pub confidence: f64,
    /// Human-readable explanation
    pub reason: String,
    /// Variables for the execution bridge
    pub variables: Variables,
    /// Strategy that produced this result
    pub strategy: StrategyKind,
}

/// A way of choosing one descriptor for a prompt
#[async_trait]
pub trait MatchStrategy: Send + Sync {
    /// Strategy identity
    fn kind(&self) -> StrategyKind;

    /// Pick a descriptor from a non-empty `catalog`
    async fn try_match(
        &self,
        prompt: &str,
        catalog: &[AutomationDescriptor],
    ) -> Result<MatchResult>;
}
