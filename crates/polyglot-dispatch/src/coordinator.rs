//! Fan-out of user signals to slots

use crate::effects::Effect;
use crate::invoker::ServiceInvoker;
use crate::request::SourceInput;
use crate::slot::{DispatchParams, SlotActor, SlotCommand, SlotView};
use polyglot_config::{AutoCopy, ConfigStore};
use polyglot_core::{Capability, InstanceKey, LanguagePair, ServiceInstance};
use polyglot_plugins::{RegistryError, RegistrySnapshot};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("No slot at index {0}")]
    NoSuchSlot(usize),

    #[error("Slot {0} is no longer running")]
    SlotClosed(usize),

    #[error("Registry reload failed: {0}")]
    Registry(#[from] RegistryError),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

struct SlotHandle {
    instance: ServiceInstance,
    commands: mpsc::UnboundedSender<SlotCommand>,
}

/// Owns one slot task per enabled translate instance.
///
/// All methods are non-blocking: they hand a command to the affected slots
/// and return. Results arrive on the effect channel returned by
/// [`DispatchCoordinator::new`].
pub struct DispatchCoordinator {
    config: Arc<ConfigStore>,
    invoker: Arc<ServiceInvoker>,
    slots: Vec<SlotHandle>,
    pair: LanguagePair,
    input: Option<Arc<SourceInput>>,
    effects: mpsc::UnboundedSender<Effect>,
}

impl std::fmt::Debug for DispatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchCoordinator")
            .field("slots", &self.instances().iter().map(|i| i.key.to_string()).collect::<Vec<_>>())
            .field("pair", &self.pair)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

impl DispatchCoordinator {
    /// Spawn one slot per enabled translate instance in the current config.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        config: Arc<ConfigStore>,
        invoker: Arc<ServiceInvoker>,
    ) -> (Self, mpsc::UnboundedReceiver<Effect>) {
        let (effects, effect_rx) = mpsc::unbounded_channel();
        let snapshot = config.snapshot();
        let pair = LanguagePair::new(
            snapshot.translate.source_language.clone(),
            snapshot.translate.target_language.clone(),
        );

        let slots = snapshot
            .instances(Capability::Translate)
            .into_iter()
            .enumerate()
            .map(|(index, instance)| SlotHandle {
                commands: SlotActor::spawn(index, instance.clone(), invoker.clone(), effects.clone()),
                instance,
            })
            .collect::<Vec<_>>();
        info!("Dispatch coordinator started with {} slots", slots.len());

        let coordinator = Self {
            config,
            invoker,
            slots,
            pair,
            input: None,
            effects,
        };
        (coordinator, effect_rx)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Instances in slot order
    pub fn instances(&self) -> Vec<ServiceInstance> {
        self.slots.iter().map(|s| s.instance.clone()).collect()
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.pair
    }

    pub fn input(&self) -> Option<&SourceInput> {
        self.input.as_deref()
    }

    pub fn invoker(&self) -> &Arc<ServiceInvoker> {
        &self.invoker
    }

    fn send(&self, index: usize, command: SlotCommand) -> CoordinatorResult<()> {
        let slot = self
            .slots
            .get(index)
            .ok_or(CoordinatorError::NoSuchSlot(index))?;
        slot.commands
            .send(command)
            .map_err(|_| CoordinatorError::SlotClosed(index))
    }

    fn params(&self) -> Option<DispatchParams> {
        self.input.as_ref().map(|input| DispatchParams {
            input: input.clone(),
            config: self.config.snapshot(),
        })
    }

    fn rearm_all(&self) {
        let Some(params) = self.params() else {
            return;
        };
        for index in 0..self.slots.len() {
            if let Err(e) = self.send(index, SlotCommand::Dispatch(params.clone())) {
                debug!("{}", e);
            }
        }
    }

    /// New source text re-arms every slot.
    ///
    /// Blank text clears all slots instead.
    pub fn new_source(&mut self, text: impl Into<String>, detected: impl Into<String>) {
        let input = SourceInput::new(text, self.pair.clone(), detected);
        if input.is_dispatchable() {
            self.copy_source(&input.text);
            self.input = Some(Arc::new(input));
            self.rearm_all();
        } else {
            self.input = None;
            self.reset();
        }
    }

    fn copy_source(&self, text: &str) {
        let config = self.config.snapshot();
        let settings = &config.translate;
        if settings.auto_copy != AutoCopy::Source || settings.clipboard_monitor {
            return;
        }
        let _ = self.effects.send(Effect::ClipboardWrite(text.to_string()));
        if settings.hide_window {
            let _ = self.effects.send(Effect::clipboard_notification(text));
        }
    }

    /// A language change re-arms every slot with the current text
    pub fn set_languages(&mut self, pair: LanguagePair) {
        if pair == self.pair {
            return;
        }
        self.pair = pair.clone();
        if let Some(input) = &self.input {
            let updated = SourceInput::new(input.text.clone(), pair, input.detected.clone());
            self.input = Some(Arc::new(updated));
            self.rearm_all();
        }
    }

    /// Re-issue the last request of one slot under a fresh generation
    pub fn retry(&self, slot: usize) -> CoordinatorResult<()> {
        self.send(slot, SlotCommand::Retry(self.config.snapshot()))
    }

    /// Translate a settled result back toward the source language.
    ///
    /// Ignored by slots that are still dispatching or hold no text.
    pub fn translate_back(&self, slot: usize) -> CoordinatorResult<()> {
        self.send(slot, SlotCommand::TranslateBack(self.config.snapshot()))
    }

    /// Point one slot at another instance and re-arm only that slot
    pub fn switch_instance(&mut self, slot: usize, key: InstanceKey) -> CoordinatorResult<()> {
        let config = self.config.snapshot();
        let instance = ServiceInstance::new(key.clone(), config.instance_config(&key));
        let params = self.params();
        self.send(
            slot,
            SlotCommand::SwitchInstance {
                instance: instance.clone(),
                params,
            },
        )?;
        if let Some(handle) = self.slots.get_mut(slot) {
            handle.instance = instance;
        }
        Ok(())
    }

    /// Clear every slot and invalidate whatever is in flight
    pub fn reset(&mut self) {
        self.input = None;
        for index in 0..self.slots.len() {
            if let Err(e) = self.send(index, SlotCommand::Reset) {
                debug!("{}", e);
            }
        }
    }

    /// Rescan plugin roots. Slots pick up the new snapshot on their next dispatch.
    pub fn reload_registry(&self) -> CoordinatorResult<Arc<RegistrySnapshot>> {
        Ok(self.invoker.registry().reload()?)
    }

    /// Current state of one slot
    pub async fn view(&self, slot: usize) -> CoordinatorResult<SlotView> {
        let (tx, rx) = oneshot::channel();
        self.send(slot, SlotCommand::View(tx))?;
        rx.await.map_err(|_| CoordinatorError::SlotClosed(slot))
    }

    pub async fn views(&self) -> CoordinatorResult<Vec<SlotView>> {
        let mut views = Vec::with_capacity(self.slots.len());
        for index in 0..self.slots.len() {
            views.push(self.view(index).await?);
        }
        Ok(views)
    }
}
