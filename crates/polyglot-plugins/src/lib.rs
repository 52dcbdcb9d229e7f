//! Plugin layer for Polyglot
//!
//! Plugins are directories with an `info.json` manifest and a Lua entry
//! script, grouped by capability:
//!
//! ```text
//! plugins/
//! ├── translate/
//! │   └── deepl/
//! │       ├── info.json
//! │       └── main.lua      -- defines translate(text, from, to, options)
//! └── tts/
//!     └── edge/
//!         ├── info.json
//!         └── main.lua      -- defines tts(text, lang, options)
//! ```
//!
//! - [`PluginRegistry`] discovers manifests and swaps in whole snapshots on reload
//! - [`PluginLoader`] loads an entry script once and caches the handle
//! - [`PluginService`] implements the core service traits on top of Lua

mod loader;
mod manifest;
mod registry;
mod runtime;

pub use loader::{PluginLoader, PluginService};
pub use manifest::{ConfigNeed, ManifestError, ManifestResult, PluginManifest, MANIFEST_FILE};
pub use registry::{
    scan, CapabilityRegistry, CapabilityRegistryBuilder, PluginRegistry, RegistryError,
    RegistryResult, RegistrySnapshot, PLUGIN_PATH_ENV,
};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or running a plugin entry script
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Failed to read plugin entry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Lua(String),

    #[error("Entry {entry} does not define function `{function}`")]
    MissingEntryFunction { entry: String, function: String },

    #[error("Invalid plugin result: {0}")]
    InvalidResult(String),

    #[error("Plugin task failed: {0}")]
    Join(String),
}

impl From<mlua::Error> for PluginError {
    fn from(err: mlua::Error) -> Self {
        Self::Lua(runtime::script_error_message(&err))
    }
}

pub type PluginResult<T> = Result<T, PluginError>;
