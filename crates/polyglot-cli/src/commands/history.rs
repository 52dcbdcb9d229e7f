use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::context::{load_config, open_history};
use crate::output;

/// List recent entries, newest first, or clear them all
pub async fn execute(config_path: Option<PathBuf>, limit: usize, clear: bool) -> Result<()> {
    let config = load_config(config_path)?.snapshot();
    let store = open_history(&config)?;

    if clear {
        let removed = tokio::task::spawn_blocking(move || store.clear())
            .await
            .context("History task failed")??;
        println!("Removed {} history entries", removed);
        return Ok(());
    }

    let entries = tokio::task::spawn_blocking(move || store.recent(limit))
        .await
        .context("History task failed")??;

    if entries.is_empty() {
        println!("{}", "No history yet".dimmed());
        return Ok(());
    }

    for entry in entries {
        let when = entry
            .time()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| entry.timestamp.to_string());
        println!(
            "{} {} {}→{}",
            when.dimmed(),
            entry.service.cyan(),
            entry.source,
            entry.target
        );
        println!("  {}", output::truncate(&entry.text, 72));
        println!("  {}", output::truncate(&entry.result, 72).green());
    }
    Ok(())
}
