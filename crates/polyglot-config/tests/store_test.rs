//! ConfigStore file round-trips and snapshot semantics

use polyglot_config::{AutoCopy, Config, ConfigError, ConfigStore};
use polyglot_core::{Capability, InstanceKey};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_missing_file_yields_defaults() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::load(temp.path().join("config.toml")).unwrap();
    assert_eq!(*store.snapshot(), Config::default());
}

#[test]
fn test_save_then_load_preserves_settings() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("config.toml");
    let store = ConfigStore::load(&path).unwrap();

    store
        .update(|cfg| {
            cfg.translate.auto_copy = AutoCopy::Target;
            cfg.services.translate = vec![InstanceKey::plugin("deepl").with_suffix("pro")];
            cfg.instances.insert(
                "[plugin]deepl@pro".into(),
                serde_json::json!({ "authKey": "abc" })
                    .as_object()
                    .unwrap()
                    .clone(),
            );
        })
        .unwrap();
    store.save().unwrap();

    let reloaded = ConfigStore::load(&path).unwrap().snapshot();
    assert_eq!(reloaded.translate.auto_copy, AutoCopy::Target);
    let slots = reloaded.instances(Capability::Translate);
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].config_str("authKey"), Some("abc"));
}

#[test]
fn test_snapshot_is_unaffected_by_later_update() {
    let store = ConfigStore::in_memory(Config::default());
    let before = store.snapshot();

    store
        .update(|cfg| cfg.translate.target_language = "fr".into())
        .unwrap();

    assert_eq!(before.translate.target_language, "zh_cn");
    assert_eq!(store.snapshot().translate.target_language, "fr");
}

#[test]
fn test_invalid_update_keeps_previous_snapshot() {
    let store = ConfigStore::in_memory(Config::default());
    let err = store
        .update(|cfg| cfg.translate.second_language = "auto".into())
        .unwrap_err();

    assert!(matches!(err, ConfigError::Invalid(_)));
    assert_eq!(store.snapshot().translate.second_language, "en");
}

#[test]
fn test_reload_picks_up_file_changes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "[translate]\ntarget_language = \"ja\"\n").unwrap();

    let store = ConfigStore::load(&path).unwrap();
    assert_eq!(store.snapshot().translate.target_language, "ja");

    fs::write(&path, "[translate]\ntarget_language = \"ko\"\n").unwrap();
    store.reload().unwrap();
    assert_eq!(store.snapshot().translate.target_language, "ko");

    fs::write(&path, "[translate]\ntarget_language = 5\n").unwrap();
    assert!(store.reload().is_err());
    assert_eq!(store.snapshot().translate.target_language, "ko");
}
