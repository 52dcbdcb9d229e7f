#![allow(dead_code)]

use async_trait::async_trait;
use polyglot_config::{Config, ConfigStore};
use polyglot_core::{
    Capability, InstanceKey, InvocationContext, LanguageMap, ServiceDescriptor, ServiceError,
    ServiceResult, TranslateResult, TranslateService,
};
use polyglot_dispatch::{DispatchCoordinator, Effect, ServiceInvoker};
use polyglot_plugins::{PluginLoader, PluginRegistry};
use polyglot_services::Builtins;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub fn languages() -> LanguageMap {
    [
        ("auto", "auto"),
        ("en", "en"),
        ("fr", "fr"),
        ("de", "de"),
        ("zh_cn", "zh"),
    ]
    .into_iter()
    .collect()
}

/// How a [`FakeTranslate`] answers
#[derive(Clone, Copy)]
pub enum Behavior {
    /// `"<to>:<text>"` padded with spaces; text containing "slow" takes longer
    Prefix,
    /// Returns the input unchanged
    Identity,
    /// Pushes partials `""`, `"a"`, `"ab"` then resolves `" abc "`
    Stream,
    /// Rejects with a fixed reason
    Fail,
    /// Returns the instance's `requestPath` config, or `<none>`
    EchoConfig,
}

pub struct FakeTranslate {
    descriptor: ServiceDescriptor,
    behavior: Behavior,
    pub calls: AtomicUsize,
    requests: Mutex<Vec<(String, String)>>,
}

impl FakeTranslate {
    pub fn new(name: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            descriptor: ServiceDescriptor::builtin(Capability::Translate, name, name, languages()),
            behavior,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Native `(from, to)` codes of every call so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslateService for FakeTranslate {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        ctx: &InvocationContext,
    ) -> ServiceResult<TranslateResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((from.to_string(), to.to_string()));
        match self.behavior {
            Behavior::Prefix => {
                let delay = if text.contains("slow") { 150 } else { 10 };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(TranslateResult::Text(format!("  {}:{}\n", to, text)))
            }
            Behavior::Identity => Ok(TranslateResult::Text(text.to_string())),
            Behavior::Stream => {
                for partial in ["", "a", "ab"] {
                    ctx.emit_partial(TranslateResult::Text(partial.to_string()));
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                Ok(TranslateResult::Text(" abc ".to_string()))
            }
            Behavior::Fail => Err(ServiceError::Backend("quota exceeded".to_string())),
            Behavior::EchoConfig => Ok(TranslateResult::Text(
                ctx.config_str("requestPath").unwrap_or("<none>").to_string(),
            )),
        }
    }
}

pub fn config(slots: &[&str]) -> Config {
    let mut config = Config::default();
    config.translate.source_language = "en".to_string();
    config.translate.target_language = "fr".to_string();
    config.translate.second_language = "de".to_string();
    config.services.translate = slots
        .iter()
        .map(|raw| InstanceKey::parse(raw).unwrap())
        .collect();
    config
}

pub fn invoker(builtins: Builtins, plugin_roots: Vec<PathBuf>) -> Arc<ServiceInvoker> {
    let registry = Arc::new(PluginRegistry::new(plugin_roots));
    registry.reload().unwrap();
    Arc::new(ServiceInvoker::new(
        builtins,
        registry,
        Arc::new(PluginLoader::default()),
    ))
}

pub fn start_with_store(
    store: Arc<ConfigStore>,
    builtins: Builtins,
) -> (DispatchCoordinator, UnboundedReceiver<Effect>) {
    DispatchCoordinator::new(store, invoker(builtins, Vec::new()))
}

pub fn start(
    config: Config,
    builtins: Builtins,
) -> (DispatchCoordinator, UnboundedReceiver<Effect>) {
    DispatchCoordinator::new(
        Arc::new(ConfigStore::in_memory(config)),
        invoker(builtins, Vec::new()),
    )
}

/// Collect effects until nothing arrives for `quiet`
pub async fn drain(rx: &mut UnboundedReceiver<Effect>, quiet: Duration) -> Vec<Effect> {
    let mut effects = Vec::new();
    while let Ok(Some(effect)) = tokio::time::timeout(quiet, rx.recv()).await {
        effects.push(effect);
    }
    effects
}

/// Collect effects until `count` slots have settled or failed, then drain the rest
pub async fn until_terminal(rx: &mut UnboundedReceiver<Effect>, count: usize) -> Vec<Effect> {
    let mut effects = Vec::new();
    let mut seen = 0;
    while seen < count {
        let effect = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for slot to settle")
            .expect("effect channel closed");
        if matches!(effect, Effect::Settled { .. } | Effect::Failed { .. }) {
            seen += 1;
        }
        effects.push(effect);
    }
    effects.extend(drain(rx, Duration::from_millis(50)).await);
    effects
}

pub fn settled(effects: &[Effect]) -> Vec<(usize, u64, TranslateResult)> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Settled {
                slot,
                generation,
                result,
            } => Some((*slot, *generation, result.clone())),
            _ => None,
        })
        .collect()
}

pub fn clipboard(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::ClipboardWrite(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

pub fn history(effects: &[Effect]) -> Vec<polyglot_dispatch::HistoryRecord> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::AppendHistory(record) => Some(record.clone()),
            _ => None,
        })
        .collect()
}

pub fn text(s: &str) -> TranslateResult {
    TranslateResult::Text(s.to_string())
}
