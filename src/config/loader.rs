//! Configuration loading
//!
//! Embedded defaults, then optional files, then `MDCRUN_` environment
//! variables, then the legacy `OPENAI_*` / `MDC_*` variables for anything
//! still unset.

use super::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        // MDCRUN_CATALOG__REMOTE_URL: single "_" after the prefix, "__" between keys
        .add_source(
            Environment::with_prefix("MDCRUN")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("catalog.expected_files")
                .with_list_parse_key("executor.args")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut app: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    app.apply_legacy_env(|key| std::env::var(key).ok());
    Ok(app)
}
