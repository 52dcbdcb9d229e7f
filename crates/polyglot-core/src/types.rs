//! Service data model: capabilities, descriptors and instances

use crate::error::InstanceKeyError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Prefix marking an instance key as plugin-backed.
pub const PLUGIN_PREFIX: &str = "[plugin]";

/// Instance config key holding a user display-name override.
pub const INSTANCE_NAME_CONFIG_KEY: &str = "instance_name";

const ENABLE_CONFIG_KEY: &str = "enable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Translate,
    Tts,
    Recognize,
    Collection,
}

impl Capability {
    pub fn all() -> [Self; 4] {
        [Self::Translate, Self::Tts, Self::Recognize, Self::Collection]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Translate => "translate",
            Self::Tts => "tts",
            Self::Recognize => "recognize",
            Self::Collection => "collection",
        }
    }

    /// Collection backends take no language arguments.
    pub fn requires_language_map(&self) -> bool {
        !matches!(self, Self::Collection)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "translate" => Ok(Self::Translate),
            "tts" => Ok(Self::Tts),
            "recognize" => Ok(Self::Recognize),
            "collection" => Ok(Self::Collection),
            other => Err(format!("unknown capability: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOrigin {
    Builtin,
    Plugin,
}

/// Abstract language tag to backend-native code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageMap(BTreeMap<String, String>);

impl LanguageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains_key(tag)
    }

    pub fn insert(&mut self, tag: impl Into<String>, native: impl Into<String>) {
        self.0.insert(tag.into(), native.into());
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LanguageMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Static description of one backend, builtin or plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub capability: Capability,
    pub origin: ServiceOrigin,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub languages: LanguageMap,
    #[serde(default)]
    pub icon: Option<PathBuf>,
}

impl ServiceDescriptor {
    pub fn builtin(
        capability: Capability,
        name: impl Into<String>,
        display_name: impl Into<String>,
        languages: LanguageMap,
    ) -> Self {
        Self {
            capability,
            origin: ServiceOrigin::Builtin,
            name: name.into(),
            display_name: display_name.into(),
            languages,
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<PathBuf>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Identifies one configured occurrence of a backend.
///
/// Textual form is `[plugin]name@suffix`; the prefix is present only for
/// plugin instances and the suffix is optional.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceKey {
    origin: ServiceOrigin,
    name: String,
    suffix: Option<String>,
}

impl InstanceKey {
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            origin: ServiceOrigin::Builtin,
            name: name.into(),
            suffix: None,
        }
    }

    pub fn plugin(name: impl Into<String>) -> Self {
        Self {
            origin: ServiceOrigin::Plugin,
            name: name.into(),
            suffix: None,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn parse(raw: &str) -> Result<Self, InstanceKeyError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InstanceKeyError::Empty);
        }

        let (origin, rest) = match raw.strip_prefix(PLUGIN_PREFIX) {
            Some(rest) => (ServiceOrigin::Plugin, rest),
            None => (ServiceOrigin::Builtin, raw),
        };

        let (name, suffix) = match rest.split_once('@') {
            Some((name, suffix)) => {
                if suffix.is_empty() {
                    return Err(InstanceKeyError::EmptySuffix(raw.to_string()));
                }
                (name, Some(suffix.to_string()))
            }
            None => (rest, None),
        };

        if name.is_empty() {
            return Err(InstanceKeyError::EmptyName(raw.to_string()));
        }
        let invalid = |s: &str| s.chars().any(|c| c == '[' || c == ']' || c.is_whitespace());
        if invalid(name) || suffix.as_deref().is_some_and(|s| invalid(s) || s.contains('@')) {
            return Err(InstanceKeyError::InvalidCharacters(raw.to_string()));
        }

        Ok(Self {
            origin,
            name: name.to_string(),
            suffix,
        })
    }

    pub fn origin(&self) -> ServiceOrigin {
        self.origin
    }

    pub fn is_plugin(&self) -> bool {
        self.origin == ServiceOrigin::Plugin
    }

    /// Backend name without the origin prefix or instance suffix.
    pub fn service_name(&self) -> &str {
        &self.name
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_plugin() {
            f.write_str(PLUGIN_PREFIX)?;
        }
        f.write_str(&self.name)?;
        if let Some(suffix) = &self.suffix {
            write!(f, "@{}", suffix)?;
        }
        Ok(())
    }
}

impl FromStr for InstanceKey {
    type Err = InstanceKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InstanceKey {
    type Error = InstanceKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InstanceKey> for String {
    fn from(key: InstanceKey) -> Self {
        key.to_string()
    }
}

/// A user-configured, ordered occurrence of a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInstance {
    pub key: InstanceKey,
    pub config: Map<String, Value>,
}

impl ServiceInstance {
    pub fn new(key: InstanceKey, config: Map<String, Value>) -> Self {
        Self { key, config }
    }

    /// Instances are enabled unless their config says `enable = false`.
    pub fn is_enabled(&self) -> bool {
        match self.config.get(ENABLE_CONFIG_KEY) {
            Some(Value::Bool(enabled)) => *enabled,
            Some(Value::String(s)) => s != "false",
            _ => true,
        }
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    /// The user override if set, otherwise the descriptor's display name.
    pub fn display_name(&self, descriptor: &ServiceDescriptor) -> String {
        match self.config_str(INSTANCE_NAME_CONFIG_KEY) {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => descriptor.display_name.clone(),
        }
    }

    /// Config as handed to a backend; plugins always see `enable = "true"`.
    pub fn invocation_config(&self) -> Map<String, Value> {
        let mut config = self.config.clone();
        if self.key.is_plugin() {
            config.insert(ENABLE_CONFIG_KEY.into(), Value::String("true".into()));
        }
        config
    }
}
