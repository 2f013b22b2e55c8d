//! CLI module for mdcrun
//!
//! Provides commands:
//! - `list`: show the automation catalog
//! - `analyze` / `run`: match a prompt, optionally execute it
//! - `refresh` / `cache`: manage the remote listing cache
//! - `history`: recent executions
//! - `doctor`: configuration diagnostics

use crate::config::{load_config, AppConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mdcrun_catalog::CatalogLoader;
use mdcrun_core::{Automator, CommandBridge, FallbackMatcher, LlmMatcher};
use mdcrun_llm::OpenAiProvider;
use std::sync::Arc;
use tracing::{debug, info};

pub mod catalog;
pub mod doctor;
pub mod history;
pub mod prompt;

/// mdcrun CLI
#[derive(Parser, Debug)]
#[command(name = "mdcrun")]
#[command(about = "Run MDC browser automations from natural-language prompts")]
#[command(version)]
pub struct Cli {
    /// Local directory of .mdc files
    #[arg(long, global = true)]
    pub catalog_dir: Option<String>,

    /// Remote catalog server (enables remote mode)
    #[arg(long, global = true)]
    pub remote_url: Option<String>,

    /// Skip the language model and use keyword matching
    #[arg(long, global = true)]
    pub no_ai: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available automations
    List,
    /// Match a prompt without executing
    Analyze {
        /// What to automate
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Match a prompt and execute the automation
    Run {
        /// What to automate
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Drop the cached remote listing and reload
    Refresh,
    /// Show remote listing cache status
    Cache,
    /// Show or clear recent executions
    History {
        /// Number of records to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Delete the history file
        #[arg(long)]
        clear: bool,
    },
    /// Show configuration diagnostics
    Doctor,
}

impl Cli {
    /// Apply command-line overrides on top of loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.catalog_dir {
            config.catalog.dir = dir.clone();
        }
        if let Some(url) = &self.remote_url {
            config.catalog.remote_url = Some(url.clone());
        }
        if self.no_ai {
            config.llm.enabled = false;
        }
    }
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command.as_ref() else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let mut config = load_config()?;
    cli.apply_overrides(&mut config);
    debug!(?config.catalog, "Configuration loaded");

    match command {
        Commands::List => catalog::list(&config).await,
        Commands::Analyze { prompt } => prompt::analyze(&config, &prompt.join(" ")).await,
        Commands::Run { prompt } => prompt::run(&config, &prompt.join(" ")).await,
        Commands::Refresh => catalog::refresh(&config).await,
        Commands::Cache => catalog::cache(&config),
        Commands::History { limit, clear } => history::run(&config, *limit, *clear),
        Commands::Doctor => doctor::run(&config).await,
    }
}

/// Keyword-only unless a model provider is configured
pub fn build_matcher(config: &AppConfig) -> Result<FallbackMatcher> {
    let Some(openai) = config.openai_config()? else {
        info!("No language model configured, using keyword matching");
        return Ok(FallbackMatcher::keyword_only());
    };

    let provider = OpenAiProvider::new(openai).context("Failed to create language model provider")?;
    let matcher = LlmMatcher::new(Arc::new(provider)).with_config(config.matcher_config());
    Ok(FallbackMatcher::with_primary(Box::new(matcher)))
}

/// Full pipeline from configuration
pub fn build_automator(config: &AppConfig) -> Result<Automator> {
    let loader = CatalogLoader::new(config.catalog_config());
    let bridge = CommandBridge::new(config.bridge_config());
    let mut automator = Automator::new(Box::new(loader), build_matcher(config)?, Box::new(bridge));
    if let Some(history) = config.history_store() {
        automator = automator.with_history(history);
    }
    Ok(automator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_words_are_collected() {
        let cli = Cli::parse_from(["mdcrun", "analyze", "check", "broken", "links"]);
        match cli.command {
            Some(Commands::Analyze { prompt }) => assert_eq!(prompt.join(" "), "check broken links"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::parse_from([
            "mdcrun",
            "list",
            "--remote-url",
            "https://mdc.example.com",
            "--catalog-dir",
            "scripts",
            "--no-ai",
        ]);
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-test".to_string());
        cli.apply_overrides(&mut config);

        assert_eq!(config.catalog.dir, "scripts");
        assert_eq!(config.catalog.remote_url.as_deref(), Some("https://mdc.example.com"));
        assert!(!build_matcher(&config).unwrap().has_primary());
    }

    #[test]
    fn test_history_flags() {
        let cli = Cli::parse_from(["mdcrun", "history", "--limit", "3", "--clear"]);
        assert!(matches!(
            cli.command,
            Some(Commands::History { limit: Some(3), clear: true })
        ));
    }
}
