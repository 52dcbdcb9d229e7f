//! Plugin manifest parsing and validation
//!
//! Each plugin bundle lives at `<root>/<capability>/<name>/` and describes
//! itself in an `info.json` manifest.
//!
//! ## Example Manifest
//!
//! ```json
//! {
//!   "id": "plugin_deepl",
//!   "display": "DeepL",
//!   "icon": "deepl.svg",
//!   "entry": "main.lua",
//!   "homepage": "https://example.com/deepl",
//!   "language": { "auto": "auto", "en": "EN", "zh_cn": "ZH" },
//!   "needs": [{ "key": "authKey", "display": "Auth Key" }]
//! }
//! ```

use polyglot_core::{Capability, LanguageMap, ServiceDescriptor, ServiceOrigin};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// File name of the manifest inside a bundle directory
pub const MANIFEST_FILE: &str = "info.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type ManifestResult<T> = Result<T, ManifestError>;

/// A configuration field the plugin asks the user for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNeed {
    pub key: String,
    #[serde(default)]
    pub display: Option<String>,
}

/// `info.json` exactly as written by the plugin author
#[derive(Debug, Clone, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display: Option<String>,
    #[serde(default)]
    icon: Option<PathBuf>,
    #[serde(default)]
    entry: Option<String>,
    #[serde(default)]
    language: Option<LanguageMap>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    needs: Vec<ConfigNeed>,
}

/// A validated plugin manifest bound to its bundle directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginManifest {
    /// Bundle directory name; the lookup key in the registry
    pub name: String,
    pub capability: Capability,
    pub id: Option<String>,
    pub display_name: String,
    pub languages: LanguageMap,
    /// Absolute path of the entry script
    pub entry: PathBuf,
    /// Absolute icon path, if the manifest declares one
    pub icon: Option<PathBuf>,
    pub homepage: Option<String>,
    pub needs: Vec<ConfigNeed>,
    pub dir: PathBuf,
}

impl PluginManifest {
    /// Parse and validate manifest JSON for the bundle at `dir`
    pub fn from_json(content: &str, capability: Capability, dir: &Path) -> ManifestResult<Self> {
        let raw: RawManifest = serde_json::from_str(content)?;

        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ManifestError::Validation(format!("invalid bundle directory: {}", dir.display()))
            })?
            .to_string();

        let languages = match raw.language {
            Some(map) if !map.is_empty() => map,
            _ if capability.requires_language_map() => {
                return Err(ManifestError::MissingField("language".to_string()));
            }
            other => other.unwrap_or_default(),
        };

        let entry = raw
            .entry
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ManifestError::MissingField("entry".to_string()))?;
        let entry = bundle_path(dir, Path::new(&entry))?;
        let icon = raw.icon.map(|icon| bundle_path(dir, &icon)).transpose()?;

        let display_name = raw
            .display
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| name.clone());

        Ok(Self {
            name,
            capability,
            id: raw.id,
            display_name,
            languages,
            entry,
            icon,
            homepage: raw.homepage,
            needs: raw.needs,
            dir: dir.to_path_buf(),
        })
    }

    /// Load the manifest from a bundle directory.
    ///
    /// Returns `Ok(None)` when the directory has no manifest at all.
    pub fn from_dir(capability: Capability, dir: &Path) -> ManifestResult<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_json(&content, capability, dir).map(Some)
    }

    pub fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor {
            capability: self.capability,
            origin: ServiceOrigin::Plugin,
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            languages: self.languages.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Resolve a manifest-relative path, refusing anything that escapes the bundle.
fn bundle_path(dir: &Path, relative: &Path) -> ManifestResult<PathBuf> {
    let escapes = relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ManifestError::Validation(format!(
            "path must stay inside the bundle: {}",
            relative.display()
        )));
    }
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };
    Ok(dir.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEEPL: &str = r#"{
        "id": "plugin_deepl",
        "display": "DeepL",
        "icon": "deepl.svg",
        "entry": "main.lua",
        "language": { "auto": "auto", "en": "EN", "zh_cn": "ZH" },
        "needs": [{ "key": "authKey", "display": "Auth Key" }]
    }"#;

    #[test]
    fn test_parse_manifest() {
        let dir = Path::new("/plugins/translate/deepl");
        let manifest = PluginManifest::from_json(DEEPL, Capability::Translate, dir).unwrap();

        assert_eq!(manifest.name, "deepl");
        assert_eq!(manifest.display_name, "DeepL");
        assert_eq!(manifest.languages.get("zh_cn"), Some("ZH"));
        assert_eq!(manifest.entry, PathBuf::from("/plugins/translate/deepl/main.lua"));
        assert_eq!(
            manifest.icon,
            Some(PathBuf::from("/plugins/translate/deepl/deepl.svg"))
        );
        assert_eq!(manifest.needs[0].key, "authKey");
    }

    #[test]
    fn test_missing_language_map_rejected() {
        let json = r#"{ "display": "X", "entry": "main.lua" }"#;
        let err = PluginManifest::from_json(json, Capability::Tts, Path::new("/p/tts/x"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::MissingField(ref f) if f == "language"));
    }

    #[test]
    fn test_collection_needs_no_language_map() {
        let json = r#"{ "display": "Anki", "entry": "main.lua" }"#;
        let manifest =
            PluginManifest::from_json(json, Capability::Collection, Path::new("/p/collection/anki"))
                .unwrap();
        assert!(manifest.languages.is_empty());
    }

    #[test]
    fn test_missing_entry_rejected() {
        let json = r#"{ "display": "X", "language": { "en": "en" } }"#;
        let err = PluginManifest::from_json(json, Capability::Translate, Path::new("/p/t/x"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::MissingField(ref f) if f == "entry"));
    }

    #[test]
    fn test_entry_outside_bundle_rejected() {
        let json = r#"{ "entry": "../../evil.lua", "language": { "en": "en" } }"#;
        let err = PluginManifest::from_json(json, Capability::Translate, Path::new("/p/t/x"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::Validation(_)));
    }

    #[test]
    fn test_display_defaults_to_bundle_name() {
        let json = r#"{ "entry": "main.lua", "language": { "en": "en" } }"#;
        let manifest =
            PluginManifest::from_json(json, Capability::Translate, Path::new("/p/t/echo")).unwrap();
        assert_eq!(manifest.display_name, "echo");

        let descriptor = manifest.descriptor();
        assert_eq!(descriptor.origin, ServiceOrigin::Plugin);
        assert_eq!(descriptor.name, "echo");
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = PluginManifest::from_json("{ not json", Capability::Translate, Path::new("/p/t/x"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::Json(_)));
    }
}
