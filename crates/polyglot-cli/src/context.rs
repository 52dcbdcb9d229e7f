//! Wiring shared by every command

use anyhow::{Context, Result};
use polyglot_config::{Config, ConfigStore};
use polyglot_dispatch::ServiceInvoker;
use polyglot_history::HistoryStore;
use polyglot_plugins::{PluginLoader, PluginRegistry};
use polyglot_services::Builtins;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub struct AppContext {
    pub config: Arc<ConfigStore>,
    pub invoker: Arc<ServiceInvoker>,
}

impl AppContext {
    /// Load configuration and scan plugin roots
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = Arc::new(load_config(config_path)?);
        let snapshot = config.snapshot();

        let http = reqwest::Client::builder()
            .user_agent(concat!("polyglot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let registry = Arc::new(PluginRegistry::with_standard_paths(&snapshot.plugins.dirs));
        registry
            .reload()
            .context("Failed to scan plugin directories")?;
        debug!("Plugin roots: {:?}", registry.roots());

        let invoker = Arc::new(ServiceInvoker::new(
            Builtins::new(http.clone()),
            registry,
            Arc::new(PluginLoader::new(http)),
        ));

        Ok(Self { config, invoker })
    }

    pub fn snapshot(&self) -> Arc<Config> {
        self.config.snapshot()
    }
}

pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(ConfigStore::default_path)
}

pub fn load_config(explicit: Option<PathBuf>) -> Result<ConfigStore> {
    let path = config_path(explicit);
    ConfigStore::load(&path).with_context(|| format!("Failed to load config from {}", path.display()))
}

pub fn open_history(config: &Config) -> Result<HistoryStore> {
    let path = config.history.resolved_path();
    HistoryStore::open(&path)
        .with_context(|| format!("Failed to open history database {}", path.display()))
}
