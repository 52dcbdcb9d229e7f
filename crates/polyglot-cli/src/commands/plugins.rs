use anyhow::Result;
use colored::Colorize;
use polyglot_core::{Capability, ServiceDescriptor};
use std::path::PathBuf;

use crate::context::AppContext;

/// List builtin and discovered plugin backends per capability
pub fn execute(config_path: Option<PathBuf>, only: Option<Capability>) -> Result<()> {
    let ctx = AppContext::load(config_path)?;
    let snapshot = ctx.invoker.registry().snapshot();

    let capabilities: Vec<Capability> = match only {
        Some(capability) => vec![capability],
        None => Capability::all().to_vec(),
    };

    for capability in capabilities {
        println!("{}", capability.as_str().bold());
        let builtins = ctx.invoker.builtins().descriptors(capability);
        let plugins = snapshot.descriptors(capability);
        if builtins.is_empty() && plugins.is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        for descriptor in &builtins {
            print_descriptor(descriptor, "builtin");
        }
        for descriptor in &plugins {
            print_descriptor(descriptor, "plugin");
        }
    }
    Ok(())
}

fn print_descriptor(descriptor: &ServiceDescriptor, origin: &str) {
    println!(
        "  {} {} {}",
        descriptor.name.cyan(),
        descriptor.display_name,
        format!("[{}, {} languages]", origin, descriptor.languages.len()).dimmed()
    );
}
