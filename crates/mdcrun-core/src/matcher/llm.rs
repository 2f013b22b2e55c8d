//! Language-model matching

use super::{MatchResult, MatchStrategy, StrategyKind};
use crate::error::{Error, Result};
use crate::extract::{extract, Variables};
use async_trait::async_trait;
use mdcrun_catalog::AutomationDescriptor;
use mdcrun_llm::{CompletionRequest, LlmProvider, Message};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Confidence used when the reply omits one
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Request settings for [`LlmMatcher`]
#[derive(Debug, Clone)]
pub struct LlmMatcherConfig {
    /// Model or deployment; provider default when `None`
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum output tokens
    pub max_tokens: u32,
}

impl Default for LlmMatcherConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.3,
            max_tokens: 1024,
        }
    }
}

/// Render the system message listing the catalog.
///
/// Entries are numbered from 0 so the listing and `mdc_index` agree.
pub fn build_system_prompt(catalog: &[AutomationDescriptor]) -> String {
    let listing = catalog
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{i}. {}: {}", d.name, d.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an automation assistant. Match user requests to available MDC automation files.

Available MDC files:
{listing}

Respond with a single JSON object containing:
- "mdc_index": index of the best matching MDC file, as numbered above
- "confidence": confidence score between 0 and 1
- "reason": brief explanation
- "variables": values extracted from the request (asset_id, new_url, old_url, link_text, old_domain, new_domain, operation)

Example response:
{{"mdc_index": 0, "confidence": 0.95, "reason": "Keywords match automation purpose", "variables": {{}}}}"#
    )
}

/// Asks a chat model which automation fits the prompt
pub struct LlmMatcher {
    provider: Arc<dyn LlmProvider>,
    config: LlmMatcherConfig,
}

impl LlmMatcher {
    /// Create a matcher over `provider`
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            config: LlmMatcherConfig::default(),
        }
    }

    /// Replace the request settings
    #[must_use]
    pub fn with_config(mut self, config: LlmMatcherConfig) -> Self {
        self.config = config;
        self
    }

    fn model(&self) -> String {
        self.config
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }
}

#[async_trait]
impl MatchStrategy for LlmMatcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Llm
    }

    #[instrument(skip(self, prompt, catalog), fields(provider = %self.provider.name(), entries = catalog.len()))]
    async fn try_match(
        &self,
        prompt: &str,
        catalog: &[AutomationDescriptor],
    ) -> Result<MatchResult> {
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        let request = CompletionRequest::new(self.model())
            .with_message(Message::system(build_system_prompt(catalog)))
            .with_message(Message::user(prompt))
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
            .with_json_mode();

        let response = self.provider.complete(request).await?;
        debug!(model = %response.model, "Match reply received");

        let reply = parse_reply(&response.content, catalog.len())?;
        let variables = if reply.variables.is_empty() {
            extract(prompt)
        } else {
            reply.variables
        };

        Ok(MatchResult {
            descriptor: catalog[reply.index].clone(),
            confidence: reply.confidence,
            reason: reply.reason,
            variables,
            strategy: StrategyKind::Llm,
        })
    }
}

#[derive(Debug)]
struct Reply {
    index: usize,
    confidence: f64,
    reason: String,
    variables: Variables,
}

/// Interpret the model's JSON answer against a catalog of `len` entries.
fn parse_reply(content: &str, len: usize) -> Result<Reply> {
    let object = json_object(content)?;

    let raw_index = object
        .get("mdc_index")
        .and_then(as_index)
        .ok_or_else(|| Error::InvalidReply("missing or non-integer mdc_index".to_string()))?;
    let index = usize::try_from(raw_index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(Error::IndexOutOfRange {
            index: raw_index,
            len,
        })?;

    let confidence = object
        .get("confidence")
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .filter(|c: &f64| !c.is_nan())
        .map_or(DEFAULT_CONFIDENCE, |c| c.clamp(0.0, 1.0));

    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let variables = object
        .get("variables")
        .or_else(|| object.get("parameters"))
        .and_then(Value::as_object)
        .map(stringify_values)
        .unwrap_or_default();

    Ok(Reply {
        index,
        confidence,
        reason,
        variables,
    })
}

/// Locate the JSON object in a reply that may carry a code fence or prose.
fn json_object(content: &str) -> Result<Map<String, Value>> {
    let start = content.find('{');
    let end = content.rfind('}');
    let slice = match (start, end) {
        (Some(s), Some(e)) if s < e => &content[s..=e],
        _ => return Err(Error::InvalidReply("no JSON object in reply".to_string())),
    };

    match serde_json::from_str(slice)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::InvalidReply("reply is not a JSON object".to_string())),
    }
}

fn as_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn stringify_values(map: &Map<String, Value>) -> Variables {
    map.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                nested => nested.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}
