//! # mdcrun-core
//!
//! Turns a natural-language request into an automation run.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`extract`](extract::extract) | Pattern-based variable extraction |
//! | [`FallbackMatcher`] | LLM matching with keyword fallback |
//! | [`ExecutionBridge`] | Seam to the external script runner |
//! | [`HistoryStore`] | JSON-lines execution log |
//! | [`Automator`] | Catalog, matcher, bridge and history in one pipeline |
//!
//! ## Quick Start
//!
//! ```ignore
//! use mdcrun_catalog::{CatalogConfig, CatalogLoader};
//! use mdcrun_core::{Automator, CommandBridge, FallbackMatcher};
//!
//! let automator = Automator::new(
//!     Box::new(CatalogLoader::new(CatalogConfig::default())),
//!     FallbackMatcher::keyword_only(),
//!     Box::new(CommandBridge::default()),
//! );
//! let result = automator.analyze("check broken links on asset/123456").await?;
//! println!("{} ({:.0}%)", result.descriptor.name, result.confidence * 100.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod error;
pub mod extract;
pub mod history;
pub mod matcher;
pub mod pipeline;

pub use bridge::{
    BridgeConfig, CommandBridge, ExecutionBridge, ExecutionErrorKind, ExecutionOutcome,
    DEFAULT_EXECUTION_TIMEOUT,
};
pub use error::{Error, Result};
pub use extract::{extract, keys, Operation, Variables};
pub use history::{ExecutionRecord, HistoryStore, DEFAULT_HISTORY_LIMIT};
pub use matcher::{
    build_system_prompt, FallbackMatcher, KeywordMatcher, LlmMatcher, LlmMatcherConfig,
    MatchResult, MatchStrategy, StrategyKind,
};
pub use pipeline::{Automator, RunReport};
