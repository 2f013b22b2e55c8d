//! Application configuration
//!
//! [`AppConfig`] mirrors `config/default.toml` and converts each section into
//! the configuration type of the crate that owns it.

mod loader;

pub use loader::load_config;

use anyhow::{Context, Result};
use mdcrun_catalog::CatalogConfig;
use mdcrun_core::{BridgeConfig, HistoryStore, LlmMatcherConfig};
use mdcrun_llm::{ApiType, OpenAiConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub executor: ExecutorSection,
    #[serde(default)]
    pub history: HistorySection,
}

/// Where automation scripts come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSection {
    #[serde(default = "default_catalog_dir")]
    pub dir: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Remote listing cache lifetime; 30 minutes when unset
    #[serde(default)]
    pub cache_minutes: Option<u64>,
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
    #[serde(default = "default_remote_cache_dir")]
    pub remote_cache_dir: String,
    #[serde(default)]
    pub expected_files: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            dir: default_catalog_dir(),
            extension: default_extension(),
            remote_url: None,
            cache_minutes: None,
            cache_file: default_cache_file(),
            remote_cache_dir: default_remote_cache_dir(),
            expected_files: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_catalog_dir() -> String {
    "mdc_files".to_string()
}
fn default_extension() -> String {
    "mdc".to_string()
}
fn default_cache_file() -> String {
    ".mdc_cache.json".to_string()
}
fn default_remote_cache_dir() -> String {
    ".mdc_remote_cache".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}

/// Chat-completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    /// Set to false to force keyword matching
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_type")]
    pub api_type: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Azure deployment id
    #[serde(default)]
    pub deployment: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            enabled: true,
            api_type: default_api_type(),
            api_key: None,
            model: None,
            deployment: None,
            base_url: None,
            api_version: None,
            timeout_secs: default_llm_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_api_type() -> String {
    "openai".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    60
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1024
}

/// External script runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSection {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_executor_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub working_dir: Option<String>,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            timeout_secs: default_executor_timeout_secs(),
            working_dir: None,
        }
    }
}

fn default_program() -> String {
    "node".to_string()
}
fn default_args() -> Vec<String> {
    vec!["mdc_executor.js".to_string()]
}
fn default_executor_timeout_secs() -> u64 {
    300
}

/// Execution log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_history_file")]
    pub file: String,
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            enabled: true,
            file: default_history_file(),
            limit: default_history_limit(),
        }
    }
}

fn default_history_file() -> String {
    ".mdc_history.jsonl".to_string()
}
fn default_history_limit() -> usize {
    mdcrun_core::DEFAULT_HISTORY_LIMIT
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Fill unset values from the legacy `OPENAI_*` and `MDC_*` variables.
    ///
    /// `lookup` stands in for `std::env::var` so tests stay hermetic.
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| non_empty(lookup(key));

        let llm = &mut self.llm;
        llm.api_key = non_empty(llm.api_key.take()).or_else(|| get("OPENAI_API_KEY"));
        if let Some(api_type) = get("OPENAI_API_TYPE") {
            if llm.api_type == default_api_type() {
                llm.api_type = api_type;
            }
        }
        llm.model = non_empty(llm.model.take()).or_else(|| get("OPENAI_MODEL"));
        llm.deployment = non_empty(llm.deployment.take()).or_else(|| get("OPENAI_DEPLOYMENT_NAME"));
        llm.base_url = non_empty(llm.base_url.take())
            .or_else(|| get("OPENAI_API_BASE"))
            .or_else(|| get("OPENAI_BASE_URL"));
        llm.api_version = non_empty(llm.api_version.take()).or_else(|| get("OPENAI_API_VERSION"));

        let catalog = &mut self.catalog;
        catalog.remote_url = non_empty(catalog.remote_url.take()).or_else(|| get("MDC_REMOTE_URL"));
        if catalog.cache_minutes.is_none() {
            catalog.cache_minutes = get("MDC_CACHE_MINUTES").and_then(|m| m.trim().parse().ok());
        }
        if catalog.expected_files.is_empty() {
            if let Some(files) = get("MDC_EXPECTED_FILES") {
                catalog.expected_files = files
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }
    }

    /// Catalog loader settings
    pub fn catalog_config(&self) -> CatalogConfig {
        let c = &self.catalog;
        let mut config = CatalogConfig::default()
            .with_catalog_dir(&c.dir)
            .with_cache_file(&c.cache_file)
            .with_remote_cache_dir(&c.remote_cache_dir)
            .with_expected_files(c.expected_files.clone())
            .with_request_timeout(Duration::from_secs(c.request_timeout_secs));
        config.extension = c.extension.trim_start_matches('.').to_string();
        if let Some(minutes) = c.cache_minutes {
            config = config.with_cache_ttl(Duration::from_secs(minutes.saturating_mul(60)));
        }
        if let Some(url) = non_empty(c.remote_url.clone()) {
            config = config.with_remote_url(url);
        }
        config
    }

    /// Provider settings, or `None` when matching should stay keyword-only
    pub fn openai_config(&self) -> Result<Option<OpenAiConfig>> {
        let llm = &self.llm;
        if !llm.enabled {
            return Ok(None);
        }
        let Some(api_key) = non_empty(llm.api_key.clone()) else {
            return Ok(None);
        };

        let api_type: ApiType = llm
            .api_type
            .parse()
            .with_context(|| format!("Invalid llm.api_type '{}'", llm.api_type))?;

        let mut config = OpenAiConfig::new(api_key).with_timeout(Duration::from_secs(llm.timeout_secs));
        config.api_type = api_type;
        if let Some(url) = non_empty(llm.base_url.clone()) {
            config = config.with_base_url(url);
        }
        if let Some(model) = &llm.model {
            config = config.with_model(model);
        }
        if let Some(deployment) = &llm.deployment {
            config = config.with_deployment(deployment);
        }
        if let Some(version) = &llm.api_version {
            config = config.with_api_version(version);
        }
        Ok(Some(config))
    }

    /// Request settings for the model matcher
    pub fn matcher_config(&self) -> LlmMatcherConfig {
        LlmMatcherConfig {
            model: None,
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
        }
    }

    /// Runner command line
    pub fn bridge_config(&self) -> BridgeConfig {
        let e = &self.executor;
        BridgeConfig {
            program: e.program.clone(),
            args: e.args.clone(),
            timeout: Duration::from_secs(e.timeout_secs),
            working_dir: e.working_dir.as_ref().map(PathBuf::from),
        }
    }

    /// History store, when enabled
    pub fn history_store(&self) -> Option<HistoryStore> {
        self.history
            .enabled
            .then(|| HistoryStore::new(&self.history.file))
    }
}
