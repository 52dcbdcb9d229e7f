//! Slot lifecycle through the coordinator with in-process fake backends

mod common;

use common::*;
use polyglot_config::{AutoCopy, ConfigStore};
use polyglot_core::{InstanceKey, LanguagePair, TranslateResult};
use polyglot_dispatch::{Effect, SlotStatus, CLIPBOARD_NOTIFY_TITLE};
use polyglot_services::Builtins;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn prefix_builtins() -> Builtins {
    Builtins::empty()
        .with_translate("fake", FakeTranslate::new("fake", Behavior::Prefix))
        .with_translate("identity", FakeTranslate::new("identity", Behavior::Identity))
}

#[tokio::test]
async fn test_single_slot_settles_trimmed_result() {
    let (mut coordinator, mut rx) = start(config(&["fake"]), prefix_builtins());

    coordinator.new_source("hello", "en");
    let effects = until_terminal(&mut rx, 1).await;

    assert_eq!(
        effects[0],
        Effect::Loading {
            slot: 0,
            generation: 1
        }
    );
    assert_eq!(settled(&effects), vec![(0, 1, text("fr:hello"))]);
    assert!(effects.contains(&Effect::Uncollapse {
        slot: 0,
        generation: 1
    }));

    let view = coordinator.view(0).await.unwrap();
    assert_eq!(view.status, SlotStatus::Settled);
    assert_eq!(view.result, Some(text("fr:hello")));
    assert!(view.uncollapsed);
}

#[tokio::test]
async fn test_newer_request_wins_over_slower_older_one() {
    let (mut coordinator, mut rx) = start(config(&["fake"]), prefix_builtins());

    coordinator.new_source("slow first", "en");
    coordinator.new_source("fast second", "en");

    let effects = until_terminal(&mut rx, 1).await;
    let effects = [effects, drain(&mut rx, Duration::from_millis(300)).await].concat();

    assert_eq!(settled(&effects), vec![(0, 2, text("fr:fast second"))]);
    let records = history(&effects);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "fast second");

    let view = coordinator.view(0).await.unwrap();
    assert_eq!(view.generation, 2);
    assert_eq!(view.result, Some(text("fr:fast second")));
}

#[tokio::test]
async fn test_newer_slow_request_wins_over_faster_older_one() {
    let (mut coordinator, mut rx) = start(config(&["fake"]), prefix_builtins());

    coordinator.new_source("fast first", "en");
    coordinator.new_source("slow second", "en");

    let effects = until_terminal(&mut rx, 1).await;
    let effects = [effects, drain(&mut rx, Duration::from_millis(100)).await].concat();

    assert_eq!(settled(&effects), vec![(0, 2, text("fr:slow second"))]);
}

#[tokio::test]
async fn test_partials_uncollapse_once() {
    let builtins = Builtins::empty().with_translate("stream", FakeTranslate::new("stream", Behavior::Stream));
    let (mut coordinator, mut rx) = start(config(&["stream"]), builtins);

    coordinator.new_source("hello", "en");
    let effects = until_terminal(&mut rx, 1).await;

    let partials: Vec<_> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::Partial { result, .. } => Some(result.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(partials, vec![text(""), text("a"), text("ab")]);

    let uncollapse_at: Vec<_> = effects
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, Effect::Uncollapse { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(uncollapse_at.len(), 1);
    // Right after the first non-empty partial
    assert_eq!(
        effects[uncollapse_at[0] - 1],
        Effect::Partial {
            slot: 0,
            generation: 1,
            result: text("a")
        }
    );
    assert_eq!(settled(&effects), vec![(0, 1, text("abc"))]);
}

#[tokio::test]
async fn test_blank_source_clears_instead_of_dispatching() {
    let (mut coordinator, mut rx) = start(config(&["identity"]), prefix_builtins());

    coordinator.new_source("   \n", "en");
    let effects = drain(&mut rx, Duration::from_millis(50)).await;
    assert_eq!(effects, vec![Effect::Cleared { slot: 0 }]);
    assert!(coordinator.input().is_none());

    coordinator.new_source("x", "en");
    let effects = until_terminal(&mut rx, 1).await;
    assert_eq!(settled(&effects), vec![(0, 2, text("x"))]);
}

#[tokio::test]
async fn test_unsupported_language_fails_without_backend_call() {
    let fake = FakeTranslate::new("fake", Behavior::Prefix);
    let builtins = Builtins::empty().with_translate("fake", fake.clone());
    let mut cfg = config(&["fake"]);
    cfg.translate.target_language = "ja".to_string();
    let (mut coordinator, mut rx) = start(cfg, builtins);

    coordinator.new_source("hello", "en");
    let effects = until_terminal(&mut rx, 1).await;

    assert!(effects.contains(&Effect::Failed {
        slot: 0,
        generation: 1,
        reason: "Language not supported: ja".to_string()
    }));
    assert_eq!(fake.call_count(), 0);
    assert!(history(&effects).is_empty());
    assert_eq!(
        coordinator.view(0).await.unwrap().result,
        Some(TranslateResult::Failure("Language not supported: ja".into()))
    );
}

#[tokio::test]
async fn test_backend_failure_is_verbatim_and_retry_mints_new_generation() {
    let fake = FakeTranslate::new("broken", Behavior::Fail);
    let builtins = Builtins::empty().with_translate("broken", fake.clone());
    let (mut coordinator, mut rx) = start(config(&["broken"]), builtins);

    coordinator.new_source("hello", "en");
    let first = until_terminal(&mut rx, 1).await;
    assert!(first.contains(&Effect::Failed {
        slot: 0,
        generation: 1,
        reason: "quota exceeded".to_string()
    }));

    coordinator.retry(0).unwrap();
    let second = until_terminal(&mut rx, 1).await;
    assert_eq!(
        second[0],
        Effect::Loading {
            slot: 0,
            generation: 2
        }
    );
    assert!(second.contains(&Effect::Failed {
        slot: 0,
        generation: 2,
        reason: "quota exceeded".to_string()
    }));
    assert_eq!(fake.call_count(), 2);
}

#[tokio::test]
async fn test_secondary_language_substitution_in_history() {
    let mut cfg = config(&["fake"]);
    cfg.translate.source_language = "auto".to_string();
    cfg.translate.target_language = "en".to_string();
    let (mut coordinator, mut rx) = start(cfg, prefix_builtins());

    coordinator.new_source("hello", "en");
    let effects = until_terminal(&mut rx, 1).await;

    assert_eq!(settled(&effects), vec![(0, 1, text("de:hello"))]);
    let record = &history(&effects)[0];
    assert_eq!(record.source, "en");
    assert_eq!(record.target, "de");
    assert_eq!(record.service, "fake");
    assert_eq!(record.result, "de:hello");
}

#[tokio::test]
async fn test_target_copy_only_from_primary_slot() {
    let mut cfg = config(&["fake", "fake@2"]);
    cfg.translate.auto_copy = AutoCopy::Target;
    cfg.translate.hide_window = true;
    let (mut coordinator, mut rx) = start(cfg, prefix_builtins());

    coordinator.new_source("hello", "en");
    let effects = until_terminal(&mut rx, 2).await;

    assert_eq!(clipboard(&effects), vec!["fr:hello".to_string()]);
    assert!(effects.contains(&Effect::Notify {
        title: CLIPBOARD_NOTIFY_TITLE.to_string(),
        body: "fr:hello".to_string()
    }));
    assert_eq!(history(&effects).len(), 2);
}

#[tokio::test]
async fn test_source_target_copy_joins_trimmed_source() {
    let mut cfg = config(&["fake"]);
    cfg.translate.auto_copy = AutoCopy::SourceTarget;
    let (mut coordinator, mut rx) = start(cfg, prefix_builtins());

    coordinator.new_source("  hello  ", "en");
    let effects = until_terminal(&mut rx, 1).await;

    assert_eq!(clipboard(&effects), vec!["hello\n\nfr:hello".to_string()]);
    assert!(!effects.iter().any(|e| matches!(e, Effect::Notify { .. })));
    assert_eq!(history(&effects)[0].text, "hello");
}

#[tokio::test]
async fn test_source_copy_once_per_new_source() {
    let mut cfg = config(&["fake", "fake@2", "identity"]);
    cfg.translate.auto_copy = AutoCopy::Source;
    let (mut coordinator, mut rx) = start(cfg, prefix_builtins());

    coordinator.new_source("hello", "en");
    let effects = until_terminal(&mut rx, 3).await;

    assert_eq!(clipboard(&effects), vec!["hello".to_string()]);
}

#[tokio::test]
async fn test_clipboard_monitor_and_history_disable_suppress_effects() {
    let mut cfg = config(&["fake"]);
    cfg.translate.auto_copy = AutoCopy::Target;
    cfg.translate.clipboard_monitor = true;
    cfg.translate.history_disable = true;
    let (mut coordinator, mut rx) = start(cfg, prefix_builtins());

    coordinator.new_source("hello", "en");
    let effects = until_terminal(&mut rx, 1).await;

    assert!(clipboard(&effects).is_empty());
    assert!(history(&effects).is_empty());
    assert_eq!(settled(&effects).len(), 1);
}

#[tokio::test]
async fn test_translate_back_uses_reversed_pair_without_side_effects() {
    let mut cfg = config(&["fake"]);
    cfg.translate.auto_copy = AutoCopy::Target;
    let (mut coordinator, mut rx) = start(cfg, prefix_builtins());

    coordinator.new_source("hello", "en");
    until_terminal(&mut rx, 1).await;

    coordinator.translate_back(0).unwrap();
    let effects = until_terminal(&mut rx, 1).await;

    assert_eq!(settled(&effects), vec![(0, 2, text("en:fr:hello"))]);
    assert!(clipboard(&effects).is_empty());
    assert!(history(&effects).is_empty());
}

#[tokio::test]
async fn test_translate_back_after_auto_source_targets_detected_language() {
    let fake = FakeTranslate::new("fake", Behavior::Prefix);
    let builtins = Builtins::empty().with_translate("fake", fake.clone());
    let mut cfg = config(&["fake"]);
    cfg.translate.source_language = "auto".to_string();
    cfg.translate.auto_copy = AutoCopy::Target;
    let (mut coordinator, mut rx) = start(cfg, builtins);

    coordinator.new_source("hello", "en");
    until_terminal(&mut rx, 1).await;

    coordinator.translate_back(0).unwrap();
    let effects = until_terminal(&mut rx, 1).await;

    assert_eq!(
        fake.requests(),
        vec![
            ("auto".to_string(), "fr".to_string()),
            ("auto".to_string(), "en".to_string()),
        ]
    );
    assert_eq!(settled(&effects), vec![(0, 2, text("en:fr:hello"))]);
    assert!(clipboard(&effects).is_empty());
    assert!(history(&effects).is_empty());
}

#[tokio::test]
async fn test_translate_back_identical_output_gets_trailing_space() {
    let (mut coordinator, mut rx) = start(config(&["identity"]), prefix_builtins());

    coordinator.new_source("hello", "en");
    until_terminal(&mut rx, 1).await;

    coordinator.translate_back(0).unwrap();
    let effects = until_terminal(&mut rx, 1).await;

    assert_eq!(settled(&effects), vec![(0, 2, text("hello "))]);
}

#[tokio::test]
async fn test_translate_back_without_result_is_ignored() {
    let (coordinator, mut rx) = start(config(&["fake"]), prefix_builtins());

    coordinator.translate_back(0).unwrap();
    assert!(drain(&mut rx, Duration::from_millis(50)).await.is_empty());
    assert_eq!(coordinator.view(0).await.unwrap().status, SlotStatus::Idle);
}

#[tokio::test]
async fn test_reset_clears_slots_and_drops_in_flight_results() {
    let (mut coordinator, mut rx) = start(config(&["fake", "fake@2"]), prefix_builtins());

    coordinator.new_source("slow text", "en");
    coordinator.reset();
    let effects = drain(&mut rx, Duration::from_millis(300)).await;

    assert!(settled(&effects).is_empty());
    assert!(effects.contains(&Effect::Cleared { slot: 0 }));
    assert!(effects.contains(&Effect::Cleared { slot: 1 }));
    for view in coordinator.views().await.unwrap() {
        assert_eq!(view.status, SlotStatus::Idle);
        assert_eq!(view.result, None);
    }
    assert!(coordinator.input().is_none());
}

#[tokio::test]
async fn test_switch_instance_rearms_only_that_slot() {
    let (mut coordinator, mut rx) = start(config(&["fake", "fake@2"]), prefix_builtins());

    coordinator.new_source("hello", "en");
    until_terminal(&mut rx, 2).await;

    coordinator
        .switch_instance(1, InstanceKey::builtin("identity"))
        .unwrap();
    let effects = until_terminal(&mut rx, 1).await;

    assert!(effects.iter().all(|e| e.slot() != Some(0)));
    assert_eq!(settled(&effects), vec![(1, 2, text("hello"))]);
    assert_eq!(coordinator.view(0).await.unwrap().generation, 1);
    assert_eq!(
        coordinator.instances()[1].key,
        InstanceKey::builtin("identity")
    );
}

#[tokio::test]
async fn test_language_change_rearms_all_slots() {
    let (mut coordinator, mut rx) = start(config(&["fake", "fake@2"]), prefix_builtins());

    coordinator.new_source("hello", "en");
    until_terminal(&mut rx, 2).await;

    coordinator.set_languages(LanguagePair::new("en", "de"));
    let effects = until_terminal(&mut rx, 2).await;

    let mut results = settled(&effects);
    results.sort_by_key(|(slot, _, _)| *slot);
    assert_eq!(
        results,
        vec![(0, 2, text("de:hello")), (1, 2, text("de:hello"))]
    );
}

#[tokio::test]
async fn test_unknown_slot_is_an_error() {
    let (coordinator, _rx) = start(config(&["fake"]), prefix_builtins());
    assert!(coordinator.retry(3).is_err());
}

#[tokio::test]
async fn test_disabled_instances_get_no_slot() {
    let mut cfg = config(&["fake", "identity"]);
    let mut disabled = serde_json::Map::new();
    disabled.insert("enable".into(), serde_json::Value::Bool(false));
    cfg.instances.insert("identity".into(), disabled);
    let (coordinator, _rx) = start(cfg, prefix_builtins());

    assert_eq!(coordinator.slot_count(), 1);
}

fn echo_builtins() -> Builtins {
    Builtins::empty().with_translate("echo", FakeTranslate::new("echo", Behavior::EchoConfig))
}

#[tokio::test]
async fn test_config_update_reaches_next_dispatch() {
    let store = Arc::new(ConfigStore::in_memory(config(&["echo"])));
    let (mut coordinator, mut rx) = start_with_store(store.clone(), echo_builtins());

    coordinator.new_source("one", "en");
    let first = until_terminal(&mut rx, 1).await;
    assert_eq!(settled(&first), vec![(0, 1, text("<none>"))]);

    store
        .update(|cfg| {
            let blob = json!({ "requestPath": "https://new.example" });
            cfg.instances
                .insert("echo".to_string(), blob.as_object().unwrap().clone());
        })
        .unwrap();

    coordinator.new_source("two", "en");
    let second = until_terminal(&mut rx, 1).await;
    assert_eq!(settled(&second), vec![(0, 2, text("https://new.example"))]);
}

#[tokio::test]
async fn test_retry_uses_current_config() {
    let store = Arc::new(ConfigStore::in_memory(config(&["echo"])));
    let (mut coordinator, mut rx) = start_with_store(store.clone(), echo_builtins());

    coordinator.new_source("one", "en");
    let first = until_terminal(&mut rx, 1).await;
    assert_eq!(history(&first).len(), 1);

    store
        .update(|cfg| {
            let blob = json!({ "requestPath": "https://retry.example" });
            cfg.instances
                .insert("echo".to_string(), blob.as_object().unwrap().clone());
            cfg.translate.history_disable = true;
        })
        .unwrap();

    coordinator.retry(0).unwrap();
    let second = until_terminal(&mut rx, 1).await;
    assert_eq!(settled(&second), vec![(0, 2, text("https://retry.example"))]);
    assert!(history(&second).is_empty());
}
