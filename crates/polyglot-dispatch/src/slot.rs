//! Per-slot state machine
//!
//! Each slot runs as its own task and exclusively owns its state. Backend
//! calls run in spawned tasks that report back through a channel, tagging
//! every message with the generation they were started for. The slot compares
//! that tag against its current generation before committing anything.

use crate::effects::{Effect, HistoryRecord};
use crate::invoker::ServiceInvoker;
use crate::request::{SourceInput, Translation, TranslationRequest};
use polyglot_config::{AutoCopy, Config};
use polyglot_core::{
    DispatchError, InstanceKey, PartialSink, ServiceInstance, TranslateResult,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Idle,
    Dispatching,
    Settled,
}

/// Read-only copy of a slot's state
#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub index: usize,
    pub instance: InstanceKey,
    pub generation: u64,
    pub status: SlotStatus,
    pub result: Option<TranslateResult>,
    pub uncollapsed: bool,
}

/// Input and settings captured for one forward dispatch
#[derive(Debug, Clone)]
pub(crate) struct DispatchParams {
    pub input: Arc<SourceInput>,
    pub config: Arc<Config>,
}

pub(crate) enum SlotCommand {
    Dispatch(DispatchParams),
    /// Re-issue the last input under this config snapshot
    Retry(Arc<Config>),
    TranslateBack(Arc<Config>),
    SwitchInstance {
        instance: ServiceInstance,
        params: Option<DispatchParams>,
    },
    Reset,
    View(oneshot::Sender<SlotView>),
}

enum Completion {
    Partial {
        generation: u64,
        result: TranslateResult,
    },
    Final {
        generation: u64,
        outcome: Result<Translation, DispatchError>,
    },
}

/// What the live generation was started for
#[derive(Debug, Clone)]
enum Pending {
    Forward(DispatchParams),
    /// Translate-back of the text shown when it started
    Back { shown: String },
}

pub(crate) struct SlotActor {
    index: usize,
    instance: ServiceInstance,
    invoker: Arc<ServiceInvoker>,
    effects: mpsc::UnboundedSender<Effect>,
    completions: mpsc::UnboundedSender<Completion>,
    generation: u64,
    status: SlotStatus,
    result: Option<TranslateResult>,
    uncollapsed: bool,
    pending: Option<Pending>,
    last: Option<DispatchParams>,
}

impl SlotActor {
    /// Spawn the slot task and return its command sender
    pub(crate) fn spawn(
        index: usize,
        instance: ServiceInstance,
        invoker: Arc<ServiceInvoker>,
        effects: mpsc::UnboundedSender<Effect>,
    ) -> mpsc::UnboundedSender<SlotCommand> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (completions, completion_rx) = mpsc::unbounded_channel();
        let actor = Self {
            index,
            instance,
            invoker,
            effects,
            completions,
            generation: 0,
            status: SlotStatus::Idle,
            result: None,
            uncollapsed: false,
            pending: None,
            last: None,
        };
        tokio::spawn(actor.run(cmd_rx, completion_rx));
        cmd_tx
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SlotCommand>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            tokio::select! {
                biased;
                completion = completions.recv() => match completion {
                    Some(completion) => self.on_completion(completion),
                    None => break,
                },
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }
        debug!("Slot {} stopped", self.index);
    }

    fn emit(&self, effect: Effect) {
        if self.effects.send(effect).is_err() {
            trace!("Slot {} effect dropped, no receiver", self.index);
        }
    }

    fn on_command(&mut self, command: SlotCommand) {
        match command {
            SlotCommand::Dispatch(params) => self.dispatch(params),
            SlotCommand::Retry(config) => match self.last.take() {
                Some(last) => self.dispatch(DispatchParams {
                    input: last.input,
                    config,
                }),
                None => debug!("Slot {} has nothing to retry", self.index),
            },
            SlotCommand::TranslateBack(config) => self.translate_back(&config),
            SlotCommand::SwitchInstance { instance, params } => {
                debug!("Slot {} switched to {}", self.index, instance.key);
                self.instance = instance;
                match params {
                    Some(params) => self.dispatch(params),
                    None => self.reset(),
                }
            }
            SlotCommand::Reset => self.reset(),
            SlotCommand::View(reply) => {
                let _ = reply.send(self.view());
            }
        }
    }

    fn view(&self) -> SlotView {
        SlotView {
            index: self.index,
            instance: self.instance.key.clone(),
            generation: self.generation,
            status: self.status,
            result: self.result.clone(),
            uncollapsed: self.uncollapsed,
        }
    }

    /// Mint a new generation, invalidating anything in flight
    fn begin(&mut self, pending: Pending) -> u64 {
        self.generation += 1;
        self.status = SlotStatus::Dispatching;
        self.uncollapsed = false;
        self.pending = Some(pending);
        self.emit(Effect::Loading {
            slot: self.index,
            generation: self.generation,
        });
        self.generation
    }

    /// The slot's instance with its config blob read from `config`
    fn instance_in(&self, config: &Config) -> ServiceInstance {
        let key = self.instance.key.clone();
        let blob = config.instance_config(&key);
        ServiceInstance::new(key, blob)
    }

    fn partial_sink(&self, generation: u64) -> PartialSink {
        let tx = self.completions.clone();
        Arc::new(move |result| {
            let _ = tx.send(Completion::Partial { generation, result });
        })
    }

    fn dispatch(&mut self, params: DispatchParams) {
        self.last = Some(params.clone());
        if !params.input.is_dispatchable() {
            self.reset();
            return;
        }

        self.result = None;
        let generation = self.begin(Pending::Forward(params.clone()));
        let request = TranslationRequest::new(self.index, generation, &params.input);
        let secondary = params.config.translate.second_language.clone();
        let sink = self.partial_sink(generation);
        let invoker = self.invoker.clone();
        let instance = self.instance_in(&params.config);
        let tx = self.completions.clone();

        tokio::spawn(async move {
            let outcome = invoker
                .translate(&instance, &request, &secondary, Some(sink))
                .await;
            let _ = tx.send(Completion::Final { generation, outcome });
        });
    }

    fn translate_back(&mut self, config: &Config) {
        if self.status != SlotStatus::Settled {
            debug!("Slot {} has no committed result to translate back", self.index);
            return;
        }
        let Some(params) = self.last.clone() else {
            debug!("Slot {} has no request to translate back", self.index);
            return;
        };
        let shown = match &self.result {
            Some(TranslateResult::Text(text)) if !text.trim().is_empty() => text.clone(),
            _ => {
                debug!("Slot {} has no text result to translate back", self.index);
                return;
            }
        };

        let generation = self.begin(Pending::Back {
            shown: shown.clone(),
        });
        let sink = self.partial_sink(generation);
        let invoker = self.invoker.clone();
        let instance = self.instance_in(config);
        let tx = self.completions.clone();

        tokio::spawn(async move {
            let outcome = invoker
                .translate_back(
                    &instance,
                    &shown,
                    &params.input.pair,
                    &params.input.detected,
                    Some(sink),
                )
                .await;
            let _ = tx.send(Completion::Final { generation, outcome });
        });
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.status = SlotStatus::Idle;
        self.result = None;
        self.uncollapsed = false;
        self.pending = None;
        self.emit(Effect::Cleared { slot: self.index });
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.status == SlotStatus::Dispatching
    }

    fn uncollapse_once(&mut self, generation: u64) {
        if !self.uncollapsed {
            self.uncollapsed = true;
            self.emit(Effect::Uncollapse {
                slot: self.index,
                generation,
            });
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Partial { generation, result } => {
                if !self.is_current(generation) {
                    trace!("Slot {}: {}", self.index, DispatchError::StaleResult { generation });
                    return;
                }
                let non_empty = !result.is_empty();
                self.result = Some(result.clone());
                self.emit(Effect::Partial {
                    slot: self.index,
                    generation,
                    result,
                });
                if non_empty {
                    self.uncollapse_once(generation);
                }
            }
            Completion::Final {
                generation,
                outcome,
            } => {
                if !self.is_current(generation) {
                    trace!("Slot {}: {}", self.index, DispatchError::StaleResult { generation });
                    return;
                }
                self.status = SlotStatus::Settled;
                match (outcome, self.pending.take()) {
                    (Ok(translation), Some(Pending::Forward(params))) => {
                        self.settle_forward(generation, translation, &params)
                    }
                    (Ok(translation), Some(Pending::Back { shown })) => {
                        self.settle_back(generation, translation.result, &shown)
                    }
                    (Ok(_), None) => {}
                    (Err(err), _) => self.fail(generation, err),
                }
            }
        }
    }

    fn commit(&mut self, generation: u64, result: TranslateResult) {
        let non_empty = !result.is_empty();
        self.result = Some(result.clone());
        self.emit(Effect::Settled {
            slot: self.index,
            generation,
            result,
        });
        if non_empty {
            self.uncollapse_once(generation);
        }
    }

    fn settle_forward(&mut self, generation: u64, translation: Translation, params: &DispatchParams) {
        let result = translation.result.trimmed();
        self.commit(generation, result.clone());

        let settings = &params.config.translate;
        let source = params.input.text.trim();
        if self.index == 0 && !settings.clipboard_monitor {
            let body = match settings.auto_copy {
                AutoCopy::Target => Some(result.to_plain_text()),
                AutoCopy::SourceTarget => {
                    Some(format!("{}\n\n{}", source, result.to_plain_text()))
                }
                AutoCopy::Disable | AutoCopy::Source => None,
            };
            if let Some(body) = body {
                self.emit(Effect::ClipboardWrite(body.clone()));
                if settings.hide_window {
                    self.emit(Effect::clipboard_notification(body));
                }
            }
        }

        if !settings.history_disable {
            self.emit(Effect::AppendHistory(HistoryRecord {
                text: source.to_string(),
                source: params.input.detected.clone(),
                target: translation.target,
                service: translation.service,
                result: result.to_history_text(),
                timestamp: chrono::Utc::now().timestamp_millis(),
            }));
        }
    }

    fn settle_back(&mut self, generation: u64, result: TranslateResult, shown: &str) {
        let rendered = match result {
            TranslateResult::Text(text) if text == shown => TranslateResult::Text(format!("{} ", text)),
            other => other.trimmed(),
        };
        self.commit(generation, rendered);
    }

    fn fail(&mut self, generation: u64, err: DispatchError) {
        let reason = err.to_string();
        debug!("Slot {} failed: {}", self.index, reason);
        self.result = Some(TranslateResult::Failure(reason.clone()));
        self.emit(Effect::Failed {
            slot: self.index,
            generation,
            reason,
        });
    }
}
