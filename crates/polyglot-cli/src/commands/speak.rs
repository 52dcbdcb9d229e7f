use anyhow::{Context, Result};
use colored::Colorize;
use polyglot_core::Capability;
use std::path::PathBuf;

use crate::context::AppContext;

pub async fn execute(
    config_path: Option<PathBuf>,
    text: String,
    lang: String,
    output: PathBuf,
) -> Result<()> {
    let ctx = AppContext::load(config_path)?;
    let instance = ctx
        .snapshot()
        .primary_instance(Capability::Tts)
        .context("No TTS service enabled")?;

    let audio = ctx
        .invoker
        .speak(&instance, text.trim(), &lang)
        .await
        .with_context(|| format!("[{}] speech failed", instance.key))?;

    tokio::fs::write(&output, &audio)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} {} bytes to {}",
        "Wrote".green(),
        audio.len(),
        output.display()
    );
    Ok(())
}
