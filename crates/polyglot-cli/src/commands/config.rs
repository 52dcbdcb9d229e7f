use anyhow::{bail, Context, Result};
use colored::Colorize;
use polyglot_config::Config;
use std::path::PathBuf;

use crate::cli::ConfigCommands;
use crate::context::{config_path, load_config};

pub fn execute(explicit: Option<PathBuf>, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Init { force } => init(config_path(explicit), force),
        ConfigCommands::Show { format } => show(explicit, &format),
        ConfigCommands::Path => {
            println!("{}", config_path(explicit).display());
            Ok(())
        }
    }
}

fn init(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = Config::default().to_toml()?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{} {}", "Created config:".green(), path.display());
    Ok(())
}

fn show(explicit: Option<PathBuf>, format: &str) -> Result<()> {
    let config = load_config(explicit)?.snapshot();
    let rendered = match format {
        "toml" => config.to_toml()?,
        "json" => serde_json::to_string_pretty(config.as_ref())?,
        other => bail!("Unknown format '{}'; expected toml or json", other),
    };
    println!("{}", rendered);
    Ok(())
}
