//! Plugin discovery and the registry snapshot
//!
//! A scan walks `<root>/<capability>/<bundle>/info.json` for every root and
//! capability. Bad manifests are skipped with a warning. Reloading builds a
//! complete new snapshot and swaps it in; readers holding the previous
//! `Arc<RegistrySnapshot>` keep a consistent view.

use crate::manifest::PluginManifest;
use parking_lot::RwLock;
use polyglot_core::{Capability, Registry, RegistryBuilder, ServiceDescriptor};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Colon-separated list of extra plugin roots
pub const PLUGIN_PATH_ENV: &str = "POLYGLOT_PLUGIN_PATH";

static SNAPSHOT_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Plugin directory {path} is unreadable: {source}")]
    UnreadableRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Plugins of one capability, keyed by bundle name
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    plugins: HashMap<String, Arc<PluginManifest>>,
}

impl Registry for CapabilityRegistry {
    type Key = String;
    type Value = Arc<PluginManifest>;

    fn get<Q>(&self, key: &Q) -> Option<&Self::Value>
    where
        Self::Key: Borrow<Q>,
        Q: ?Sized + Eq + std::hash::Hash,
    {
        self.plugins.get(key)
    }

    fn iter(&self) -> impl Iterator<Item = (&Self::Key, &Self::Value)> {
        self.plugins.iter()
    }

    fn len(&self) -> usize {
        self.plugins.len()
    }
}

#[derive(Debug, Default)]
pub struct CapabilityRegistryBuilder {
    plugins: HashMap<String, Arc<PluginManifest>>,
}

impl CapabilityRegistryBuilder {
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }
}

impl RegistryBuilder for CapabilityRegistryBuilder {
    type Registry = CapabilityRegistry;
    type Key = String;
    type Value = Arc<PluginManifest>;

    fn register(mut self, key: Self::Key, value: Self::Value) -> Self {
        self.plugins.insert(key, value);
        self
    }

    fn build(self) -> Self::Registry {
        CapabilityRegistry {
            plugins: self.plugins,
        }
    }
}

/// Immutable result of one discovery pass
#[derive(Debug)]
pub struct RegistrySnapshot {
    generation: u64,
    capabilities: BTreeMap<Capability, CapabilityRegistry>,
}

impl RegistrySnapshot {
    pub fn empty() -> Self {
        Self {
            generation: 0,
            capabilities: BTreeMap::new(),
        }
    }

    /// Increases with every successful scan
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn capability(&self, capability: Capability) -> Option<&CapabilityRegistry> {
        self.capabilities.get(&capability)
    }

    pub fn get(&self, capability: Capability, name: &str) -> Option<&Arc<PluginManifest>> {
        self.capability(capability).and_then(|r| r.get(name))
    }

    /// Descriptors for `capability`, sorted by name
    pub fn descriptors(&self, capability: Capability) -> Vec<ServiceDescriptor> {
        let mut descriptors: Vec<_> = self
            .capability(capability)
            .map(|r| r.iter().map(|(_, m)| m.descriptor()).collect())
            .unwrap_or_default();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.capabilities.values().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scan `roots` and build a fresh snapshot.
///
/// Roots that do not exist are skipped. A capability directory that exists
/// but cannot be listed fails the whole scan.
pub fn scan(roots: &[PathBuf]) -> RegistryResult<RegistrySnapshot> {
    let mut capabilities = BTreeMap::new();

    for capability in Capability::all() {
        let mut builder = CapabilityRegistryBuilder::default();

        for root in roots {
            let dir = root.join(capability.as_str());
            if !dir.exists() {
                debug!("Plugin path does not exist: {}", dir.display());
                continue;
            }
            builder = scan_capability_dir(builder, capability, &dir)?;
        }

        let registry = builder.build();
        debug!("Discovered {} {} plugins", registry.len(), capability);
        capabilities.insert(capability, registry);
    }

    Ok(RegistrySnapshot {
        generation: SNAPSHOT_COUNTER.fetch_add(1, Ordering::Relaxed),
        capabilities,
    })
}

fn scan_capability_dir(
    mut builder: CapabilityRegistryBuilder,
    capability: Capability,
    dir: &Path,
) -> RegistryResult<CapabilityRegistryBuilder> {
    let entries = std::fs::read_dir(dir).map_err(|source| RegistryError::UnreadableRoot {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!("Failed to read entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if !path.is_dir() {
            continue;
        }

        match PluginManifest::from_dir(capability, &path) {
            Ok(Some(manifest)) => {
                if builder.contains(&manifest.name) {
                    debug!("Plugin already discovered: {}", manifest.name);
                    continue;
                }
                debug!("Discovered {} plugin: {}", capability, manifest.name);
                builder = builder.register(manifest.name.clone(), Arc::new(manifest));
            }
            Ok(None) => {
                debug!("No manifest found in: {}", path.display());
            }
            Err(e) => {
                warn!("Failed to load manifest from {}: {}", path.display(), e);
            }
        }
    }

    Ok(builder)
}

/// Owns the plugin roots and the current snapshot
pub struct PluginRegistry {
    roots: Vec<PathBuf>,
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("roots", &self.roots)
            .field("plugins", &self.current.read().len())
            .finish()
    }
}

impl PluginRegistry {
    /// A registry over `roots` with an empty snapshot; call [`reload`](Self::reload)
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            current: RwLock::new(Arc::new(RegistrySnapshot::empty())),
        }
    }

    /// Roots from `POLYGLOT_PLUGIN_PATH`, then `$XDG_CONFIG_HOME/polyglot/plugins`,
    /// then `extra`
    pub fn with_standard_paths(extra: &[PathBuf]) -> Self {
        let mut roots: Vec<PathBuf> = Vec::new();
        let mut push = |path: PathBuf| {
            if !roots.contains(&path) {
                roots.push(path);
            }
        };

        if let Ok(env_paths) = std::env::var(PLUGIN_PATH_ENV) {
            let separator = if cfg!(windows) { ';' } else { ':' };
            for p in env_paths.split(separator).filter(|p| !p.is_empty()) {
                push(PathBuf::from(p));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            push(config_dir.join("polyglot").join("plugins"));
        }

        for path in extra {
            push(path.clone());
        }

        Self::new(roots)
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.read().clone()
    }

    pub fn get(&self, capability: Capability, name: &str) -> Option<Arc<PluginManifest>> {
        self.current.read().get(capability, name).cloned()
    }

    /// Rescan every root and replace the snapshot. On failure the previous
    /// snapshot stays in place.
    pub fn reload(&self) -> RegistryResult<Arc<RegistrySnapshot>> {
        let snapshot = Arc::new(scan(&self.roots)?);
        info!(
            "Plugin registry loaded {} plugins (generation {})",
            snapshot.len(),
            snapshot.generation()
        );
        *self.current.write() = snapshot.clone();
        Ok(snapshot)
    }
}
