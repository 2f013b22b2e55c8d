//! Catalog commands: `list`, `refresh`, `cache`

use crate::config::AppConfig;
use anyhow::{Context, Result};
use mdcrun_catalog::{AutomationDescriptor, CacheStatus, CatalogLoader, CatalogSource};

fn source_marker(descriptor: &AutomationDescriptor) -> &'static str {
    if descriptor.is_remote() {
        "🌐"
    } else {
        "📁"
    }
}

pub(crate) fn print_catalog(files: &[AutomationDescriptor]) {
    if files.is_empty() {
        println!("No MDC files available.");
        return;
    }
    for d in files {
        println!("{} {}", source_marker(d), d.name);
        println!("   {}", d.description);
    }
}

fn print_cache_status(status: &CacheStatus) {
    match status.timestamp {
        Some(ts) => {
            let state = if status.fresh { "✅ fresh" } else { "⚠️  expired" };
            println!(
                "Cache: {} ({} files, written {})",
                state,
                status.entries,
                ts.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        None => println!("Cache: empty"),
    }
}

pub async fn list(config: &AppConfig) -> Result<()> {
    let loader = CatalogLoader::new(config.catalog_config());
    let files = loader.list_descriptors().await;
    println!("📋 Available automations ({})\n", files.len());
    print_catalog(&files);
    Ok(())
}

pub async fn refresh(config: &AppConfig) -> Result<()> {
    let loader = CatalogLoader::new(config.catalog_config());
    if !loader.is_remote() {
        println!("Local mode: nothing cached, rescanning {}", config.catalog.dir);
    }
    loader.refresh().context("Failed to clear catalog cache")?;

    let files = loader.list_descriptors().await;
    println!("🔄 Catalog reloaded: {} files\n", files.len());
    print_catalog(&files);
    Ok(())
}

pub fn cache(config: &AppConfig) -> Result<()> {
    let loader = CatalogLoader::new(config.catalog_config());
    let catalog = loader.config();
    println!("Cache file: {}", catalog.cache_file.display());
    println!("TTL: {} minutes", catalog.cache_ttl.as_secs() / 60);
    print_cache_status(&loader.cache_status());
    Ok(())
}
