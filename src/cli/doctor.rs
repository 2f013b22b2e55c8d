//! `doctor` command: show how mdcrun is configured

use super::build_matcher;
use crate::config::AppConfig;
use anyhow::Result;
use mdcrun_catalog::{CatalogLoader, CatalogSource};
use std::path::Path;

pub async fn run(config: &AppConfig) -> Result<()> {
    println!("🏥 mdcrun Doctor\n");

    let mut all_ok = true;
    check_env_file();
    all_ok &= check_llm(config);
    all_ok &= check_catalog(config).await;
    check_executor(config);

    println!();
    if all_ok {
        println!("✅ Ready to run automations.");
    } else {
        println!("⚠️  Some checks failed. Please fix the issues above.");
    }
    Ok(())
}

fn check_env_file() {
    print!("Checking .env file... ");
    if Path::new(".env").exists() {
        println!("✅ Found");
    } else {
        println!("⚠️  Not found (environment and config files only)");
    }
}

fn check_llm(config: &AppConfig) -> bool {
    print!("Checking AI matching... ");
    match build_matcher(config) {
        Ok(matcher) if matcher.has_primary() => {
            let model = config
                .llm
                .model
                .as_deref()
                .or(config.llm.deployment.as_deref())
                .unwrap_or("provider default");
            println!("✅ Connected ({}, model: {})", config.llm.api_type, model);
            true
        }
        Ok(_) => {
            println!("⚠️  Fallback mode (keyword matching; set OPENAI_API_KEY to enable)");
            true
        }
        Err(e) => {
            println!("❌ {e:#}");
            false
        }
    }
}

async fn check_catalog(config: &AppConfig) -> bool {
    let loader = CatalogLoader::new(config.catalog_config());
    match &config.catalog_config().remote_url {
        Some(url) => println!("Catalog source: 🌐 remote ({url})"),
        None => println!("Catalog source: 📁 local ({})", config.catalog.dir),
    }

    let files = loader.list_descriptors().await;
    let remote = files.iter().filter(|d| d.is_remote()).count();
    print!("Checking catalog... ");
    if files.is_empty() {
        println!("❌ No MDC files found");
        false
    } else {
        println!("✅ {} files ({} remote, {} local)", files.len(), remote, files.len() - remote);
        true
    }
}

fn check_executor(config: &AppConfig) {
    let bridge = config.bridge_config();
    println!(
        "Executor: {} {} (timeout {}s)",
        bridge.program,
        bridge.args.join(" "),
        bridge.timeout.as_secs()
    );
}
