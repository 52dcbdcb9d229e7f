//! Snapshot store for the active configuration
//!
//! Readers take an `Arc<Config>` and keep it for the duration of a dispatch.
//! Writers build a new `Config` and swap it in, so a change made mid-flight
//! only affects later dispatches.

use crate::config::{Config, ConfigResult};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Holds the current configuration snapshot and its backing file
pub struct ConfigStore {
    path: Option<PathBuf>,
    current: RwLock<Arc<Config>>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    /// Default config path: `$XDG_CONFIG_HOME/polyglot/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config")
            })
            .join("polyglot")
            .join("config.toml")
    }

    /// Load from `path`; a missing or empty file yields defaults
    pub fn load(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let config = read_config(&path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// A store with no backing file
    pub fn in_memory(config: Config) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current configuration
    pub fn snapshot(&self) -> Arc<Config> {
        self.current.read().clone()
    }

    /// Apply `f` to a copy of the current config, validate it and swap it in
    pub fn update<F>(&self, f: F) -> ConfigResult<Arc<Config>>
    where
        F: FnOnce(&mut Config),
    {
        let mut next = (*self.snapshot()).clone();
        f(&mut next);
        next.validate()?;

        let next = Arc::new(next);
        *self.current.write() = next.clone();
        debug!("Configuration snapshot replaced");
        Ok(next)
    }

    /// Re-read the backing file. Keeps the current snapshot on error.
    pub fn reload(&self) -> ConfigResult<Arc<Config>> {
        let Some(path) = &self.path else {
            return Ok(self.snapshot());
        };
        match read_config(path) {
            Ok(config) => {
                let config = Arc::new(config);
                *self.current.write() = config.clone();
                info!("Reloaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to reload {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Write the current snapshot to the backing file
    pub fn save(&self) -> ConfigResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.snapshot().to_toml()?)?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }
}

fn read_config(path: &Path) -> ConfigResult<Config> {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    Config::from_toml(&content)
}
