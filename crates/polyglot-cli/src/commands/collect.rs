use anyhow::{bail, Result};
use colored::Colorize;
use polyglot_core::Capability;
use std::path::PathBuf;

use crate::context::AppContext;

/// Every collection instance gets the pair; failures don't stop the others
pub async fn execute(config_path: Option<PathBuf>, source: String, result: String) -> Result<()> {
    let ctx = AppContext::load(config_path)?;
    let instances = ctx.snapshot().instances(Capability::Collection);
    if instances.is_empty() {
        bail!("No collection services enabled");
    }

    let mut failed = 0;
    for instance in &instances {
        match ctx.invoker.collect(instance, &source, &result).await {
            Ok(()) => println!("{} {}", "✓".green(), instance.key),
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", "✗".red(), instance.key, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} collection services failed", failed, instances.len());
    }
    Ok(())
}
