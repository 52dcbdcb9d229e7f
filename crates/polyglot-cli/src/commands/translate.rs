use anyhow::{bail, Context, Result};
use polyglot_core::{clean_text, Capability, LanguagePair, TranslateResult};
use polyglot_dispatch::{DispatchCoordinator, Effect, HistoryRecord};
use polyglot_history::{HistoryStore, NewHistoryEntry};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::context::{open_history, AppContext};
use crate::output;

pub struct TranslateOptions {
    pub text: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub detected: String,
    pub back: bool,
    pub json: bool,
}

/// Translate with every enabled instance
pub async fn execute(config_path: Option<PathBuf>, options: TranslateOptions) -> Result<()> {
    let ctx = AppContext::load(config_path)?;
    let snapshot = ctx.snapshot();

    let raw = match options.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        }
    };
    let text = clean_text(&raw, snapshot.translate.delete_newline);
    if text.is_empty() {
        bail!("Nothing to translate");
    }

    let (mut coordinator, effects) = DispatchCoordinator::new(ctx.config.clone(), ctx.invoker.clone());
    if coordinator.slot_count() == 0 {
        bail!("No translate services enabled; add some under [services] translate");
    }

    let pair = LanguagePair::new(
        options
            .from
            .unwrap_or_else(|| snapshot.translate.source_language.clone()),
        options
            .to
            .unwrap_or_else(|| snapshot.translate.target_language.clone()),
    );
    coordinator.set_languages(pair);

    let history = if snapshot.translate.history_disable {
        None
    } else {
        match open_history(&snapshot) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!("History disabled for this run: {:#}", e);
                None
            }
        }
    };

    let mut sink = EffectSink::new(effects, history, options.json);
    let slots = coordinator.slot_count();
    coordinator.new_source(text, options.detected);
    sink.until_settled(slots).await?;

    if options.back {
        let settled: Vec<usize> = sink
            .outcomes
            .iter()
            .filter(|(_, r)| r.as_text().is_some_and(|t| !t.trim().is_empty()))
            .map(|(slot, _)| *slot)
            .collect();
        for slot in &settled {
            coordinator.translate_back(*slot)?;
        }
        sink.until_settled(settled.len()).await?;
    }

    let instances = coordinator.instances();
    let invoker = coordinator.invoker().clone();
    // Slot tasks exit once the coordinator is gone, which closes the channel
    drop(coordinator);
    let outcomes = sink.finish().await;

    if !options.json {
        for (index, instance) in instances.iter().enumerate() {
            let title = match invoker.descriptor(Capability::Translate, &instance.key) {
                Ok(descriptor) => instance.display_name(&descriptor),
                Err(_) => instance.key.to_string(),
            };
            print!("{}", output::slot_block(&title, outcomes.get(&index)));
        }
    }

    Ok(())
}

/// Drains coordinator effects, writing history and collecting outcomes
struct EffectSink {
    effects: UnboundedReceiver<Effect>,
    history: Option<HistoryStore>,
    json: bool,
    outcomes: BTreeMap<usize, TranslateResult>,
}

impl EffectSink {
    fn new(effects: UnboundedReceiver<Effect>, history: Option<HistoryStore>, json: bool) -> Self {
        Self {
            effects,
            history,
            json,
            outcomes: BTreeMap::new(),
        }
    }

    /// Handle effects until `count` slots have settled or failed
    async fn until_settled(&mut self, count: usize) -> Result<()> {
        let mut remaining = count;
        while remaining > 0 {
            let Some(effect) = self.effects.recv().await else {
                bail!("Dispatch stopped before all services answered");
            };
            if effect.is_terminal() {
                remaining -= 1;
            }
            self.handle(effect).await;
        }
        Ok(())
    }

    /// Handle whatever is left once every sender is gone
    async fn finish(mut self) -> BTreeMap<usize, TranslateResult> {
        while let Some(effect) = self.effects.recv().await {
            self.handle(effect).await;
        }
        self.outcomes
    }

    async fn handle(&mut self, effect: Effect) {
        if self.json {
            match serde_json::to_string(&effect) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to encode effect: {}", e),
            }
        }

        match effect {
            Effect::Settled { slot, result, .. } => {
                self.outcomes.insert(slot, result);
            }
            Effect::Failed { slot, reason, .. } => {
                self.outcomes.insert(slot, TranslateResult::Failure(reason));
            }
            Effect::Partial { slot, result, .. } => {
                debug!("Slot {} partial: {}", slot, output::truncate(&result.to_plain_text(), 60));
            }
            Effect::ClipboardWrite(text) => {
                info!("Clipboard write: {}", output::truncate(&text, 60));
            }
            Effect::Notify { title, body } => {
                info!("{}: {}", title, output::truncate(&body, 60));
            }
            Effect::AppendHistory(record) => self.append_history(record).await,
            Effect::Loading { .. } | Effect::Uncollapse { .. } | Effect::Cleared { .. } => {}
        }
    }

    async fn append_history(&self, record: HistoryRecord) {
        let Some(store) = self.history.clone() else {
            return;
        };
        let entry = NewHistoryEntry {
            text: record.text,
            source: record.source,
            target: record.target,
            service: record.service,
            result: record.result,
            timestamp: record.timestamp,
        };
        match tokio::task::spawn_blocking(move || store.append(&entry)).await {
            Ok(Ok(id)) => debug!("History entry {} written", id),
            Ok(Err(e)) => warn!("Failed to write history: {}", e),
            Err(e) => warn!("History task failed: {}", e),
        }
    }
}
