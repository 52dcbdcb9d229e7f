use anyhow::{Context, Result};
use base64::Engine;
use polyglot_core::Capability;
use std::path::PathBuf;
use tracing::debug;

use crate::context::AppContext;

pub async fn execute(config_path: Option<PathBuf>, image: PathBuf, lang: String) -> Result<()> {
    let ctx = AppContext::load(config_path)?;
    let instance = ctx
        .snapshot()
        .primary_instance(Capability::Recognize)
        .context("No recognition service enabled")?;

    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    debug!("Encoded {} image bytes", bytes.len());

    let text = ctx
        .invoker
        .recognize(&instance, &encoded, &lang)
        .await
        .with_context(|| format!("[{}] recognition failed", instance.key))?;

    println!("{}", text.trim());
    Ok(())
}
