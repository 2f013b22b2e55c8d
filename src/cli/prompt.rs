//! Prompt commands: `analyze` and `run`

use super::build_automator;
use crate::config::AppConfig;
use anyhow::{bail, Result};
use mdcrun_core::MatchResult;

fn print_match(result: &MatchResult) -> Result<()> {
    println!("🎯 Matched: {}", result.descriptor.name);
    println!("   Confidence: {:.0}%", result.confidence * 100.0);
    println!("   Strategy:   {}", result.strategy);
    println!("   Reason:     {}", result.reason);
    println!("   Path:       {}", result.descriptor.path);
    println!("   About:      {}", result.descriptor.description);
    if !result.variables.is_empty() {
        println!("\n⚙️  Extracted variables:");
        println!("{}", serde_json::to_string_pretty(&result.variables)?);
    }
    Ok(())
}

pub async fn analyze(config: &AppConfig, prompt: &str) -> Result<()> {
    let automator = build_automator(config)?;
    let result = automator.analyze(prompt).await?;
    print_match(&result)
}

pub async fn run(config: &AppConfig, prompt: &str) -> Result<()> {
    let automator = build_automator(config)?;
    let report = automator.run(prompt).await?;
    print_match(&report.matched)?;
    println!();

    let outcome = &report.outcome;
    if outcome.success {
        println!("✅ Execution completed");
        if !outcome.output.trim().is_empty() {
            println!("{}", outcome.output.trim_end());
        }
        Ok(())
    } else {
        println!("❌ Execution failed");
        if !outcome.error.trim().is_empty() {
            println!("{}", outcome.error.trim_end());
        }
        bail!("automation {} did not succeed", report.matched.descriptor.name)
    }
}
