//! # mdcrun-llm
//!
//! Chat-completion provider abstraction used by the prompt matcher.
//!
//! - [`LlmProvider`]: the provider seam (`complete`)
//! - [`OpenAiProvider`]: OpenAI and Azure OpenAI via `async-openai`
//! - [`MockProvider`]: queued replies for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod message;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod util;

pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use mock::MockProvider;
pub use openai::{ApiType, OpenAiConfig, OpenAiProvider};
pub use provider::LlmProvider;
