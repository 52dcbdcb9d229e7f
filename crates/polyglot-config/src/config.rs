//! Configuration schema
//!
//! ```toml
//! [translate]
//! source_language = "auto"
//! target_language = "zh_cn"
//! second_language = "en"
//! auto_copy = "target"
//!
//! [services]
//! translate = ["google", "lingva@mirror", "[plugin]deepl"]
//!
//! [instances."lingva@mirror"]
//! requestPath = "https://lingva.example"
//! instance_name = "Lingva mirror"
//! ```

use polyglot_core::language::{is_known_tag, AUTO};
use polyglot_core::{Capability, InstanceKey, ServiceInstance};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading, validating or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading or writing the config file
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Semantic validation failure
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// What gets written to the clipboard after a primary-slot translation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoCopy {
    /// Never copy
    #[default]
    Disable,
    /// Copy the source text when it arrives
    Source,
    /// Copy the primary result
    Target,
    /// Copy the trimmed source, a blank line, then the primary result
    SourceTarget,
}

/// Translation defaults and side-effect policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Abstract source tag, usually `auto`
    pub source_language: String,
    /// Abstract target tag
    pub target_language: String,
    /// Target used when the detected language already equals the target
    pub second_language: String,
    /// Clipboard policy
    pub auto_copy: AutoCopy,
    /// Send a notification when copying, since no window is visible
    pub hide_window: bool,
    /// Clipboard monitoring is active; suppresses auto-copy
    pub clipboard_monitor: bool,
    /// Skip history writes
    pub history_disable: bool,
    /// Join hyphenated line breaks and collapse whitespace in source text
    pub delete_newline: bool,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            source_language: AUTO.to_string(),
            target_language: "zh_cn".to_string(),
            second_language: "en".to_string(),
            auto_copy: AutoCopy::Disable,
            hide_window: false,
            clipboard_monitor: false,
            history_disable: false,
            delete_newline: false,
        }
    }
}

/// Ordered instance lists, one per capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Translation slots, in display order
    pub translate: Vec<InstanceKey>,
    /// Speech backends; the first one is used
    pub tts: Vec<InstanceKey>,
    /// Text recognition backends; the first one is used
    pub recognize: Vec<InstanceKey>,
    /// Collection backends
    pub collection: Vec<InstanceKey>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            translate: vec![InstanceKey::builtin("google"), InstanceKey::builtin("lingva")],
            tts: vec![InstanceKey::builtin("lingva_tts")],
            recognize: Vec::new(),
            collection: Vec::new(),
        }
    }
}

impl ServicesConfig {
    /// Instance keys configured for `capability`
    pub fn list(&self, capability: Capability) -> &[InstanceKey] {
        match capability {
            Capability::Translate => &self.translate,
            Capability::Tts => &self.tts,
            Capability::Recognize => &self.recognize,
            Capability::Collection => &self.collection,
        }
    }
}

/// Plugin discovery settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Extra plugin roots searched after the standard location
    pub dirs: Vec<PathBuf>,
}

/// History storage settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Database path; relative paths resolve against the data directory
    pub path: Option<PathBuf>,
}

impl HistoryConfig {
    /// Default: `$XDG_DATA_HOME/polyglot/history.db`
    pub fn resolved_path(&self) -> PathBuf {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("polyglot");
        match &self.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => data_dir.join(path),
            None => data_dir.join("history.db"),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Translation defaults
    pub translate: TranslateConfig,
    /// Instance lists
    pub services: ServicesConfig,
    /// Per-instance configuration keyed by instance key text
    pub instances: BTreeMap<String, Map<String, Value>>,
    /// Plugin discovery
    pub plugins: PluginsConfig,
    /// History storage
    pub history: HistoryConfig,
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check language tags and instance config keys
    pub fn validate(&self) -> ConfigResult<()> {
        let t = &self.translate;
        for (field, tag) in [
            ("source_language", &t.source_language),
            ("target_language", &t.target_language),
            ("second_language", &t.second_language),
        ] {
            if !is_known_tag(tag) {
                return Err(ConfigError::Invalid(format!(
                    "translate.{} has unknown language tag '{}'",
                    field, tag
                )));
            }
        }
        if t.target_language == AUTO || t.second_language == AUTO {
            return Err(ConfigError::Invalid(
                "target and second language cannot be 'auto'".to_string(),
            ));
        }

        for key in self.instances.keys() {
            InstanceKey::parse(key)
                .map_err(|e| ConfigError::Invalid(format!("instances.{}: {}", key, e)))?;
        }

        Ok(())
    }

    /// Raw configuration for one instance, empty if none is stored
    pub fn instance_config(&self, key: &InstanceKey) -> Map<String, Value> {
        self.instances
            .get(&key.to_string())
            .cloned()
            .unwrap_or_default()
    }

    /// Enabled instances for `capability`, in configured order
    pub fn instances(&self, capability: Capability) -> Vec<ServiceInstance> {
        self.services
            .list(capability)
            .iter()
            .map(|key| ServiceInstance::new(key.clone(), self.instance_config(key)))
            .filter(ServiceInstance::is_enabled)
            .collect()
    }

    /// First enabled instance for `capability`
    pub fn primary_instance(&self, capability: Capability) -> Option<ServiceInstance> {
        self.instances(capability).into_iter().next()
    }
}
