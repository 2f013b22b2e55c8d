//! `history` command

use crate::config::AppConfig;
use anyhow::{Context, Result};

pub fn run(config: &AppConfig, limit: Option<usize>, clear: bool) -> Result<()> {
    let Some(store) = config.history_store() else {
        println!("History is disabled (history.enabled = false)");
        return Ok(());
    };

    if clear {
        store.clear().context("Failed to clear history")?;
        println!("🗑️  History cleared");
        return Ok(());
    }

    let records = store
        .recent(limit.unwrap_or(config.history.limit))
        .context("Failed to read history")?;
    if records.is_empty() {
        println!("No executions recorded yet.");
        return Ok(());
    }

    println!("📜 Recent executions\n");
    for r in records {
        let status = if r.outcome.success { "✅" } else { "❌" };
        println!(
            "{} {}  {} ({:.0}%)",
            status,
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.script_name,
            r.confidence * 100.0
        );
        println!("   {}", r.prompt);
        if !r.outcome.success && !r.outcome.error.trim().is_empty() {
            println!("   error: {}", r.outcome.error.lines().next().unwrap_or_default());
        }
    }
    Ok(())
}
