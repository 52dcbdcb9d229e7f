//! Uniform invocation over builtin and plugin backends
//!
//! Resolution happens in two steps. The descriptor comes from the builtin
//! table or the registry snapshot, and languages are negotiated against it.
//! Only then is the backend itself resolved (loading a plugin if needed) and
//! called. A request with an unsupported tag never reaches a backend.

use crate::request::{Translation, TranslationRequest};
use polyglot_core::language::{self, NegotiatedPair};
use polyglot_core::{
    Capability, CollectionService, DispatchError, InstanceKey, InvocationContext, LanguagePair,
    PartialSink, RecognizeService, ServiceDescriptor, ServiceInstance, ServiceOrigin,
    TranslateService, TtsService,
};
use polyglot_plugins::{PluginLoader, PluginRegistry, PluginService};
use polyglot_services::Builtins;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ServiceInvoker {
    builtins: Builtins,
    registry: Arc<PluginRegistry>,
    loader: Arc<PluginLoader>,
}

impl std::fmt::Debug for ServiceInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceInvoker")
            .field("builtins", &self.builtins)
            .field("registry", &self.registry)
            .field("loader", &self.loader)
            .finish()
    }
}

impl ServiceInvoker {
    pub fn new(builtins: Builtins, registry: Arc<PluginRegistry>, loader: Arc<PluginLoader>) -> Self {
        Self {
            builtins,
            registry,
            loader,
        }
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Descriptor for `key` under `capability`, without loading anything
    pub fn descriptor(
        &self,
        capability: Capability,
        key: &InstanceKey,
    ) -> Result<ServiceDescriptor, DispatchError> {
        let name = key.service_name();
        match key.origin() {
            ServiceOrigin::Builtin => {
                self.builtins
                    .descriptor(capability, name)
                    .ok_or_else(|| DispatchError::UnknownService {
                        capability: capability.to_string(),
                        name: name.to_string(),
                    })
            }
            ServiceOrigin::Plugin => self
                .registry
                .get(capability, name)
                .map(|manifest| manifest.descriptor())
                .ok_or_else(|| {
                    DispatchError::plugin_load(
                        name,
                        format!("no {} plugin installed under this name", capability),
                    )
                }),
        }
    }

    async fn plugin(
        &self,
        capability: Capability,
        key: &InstanceKey,
    ) -> Result<Arc<PluginService>, DispatchError> {
        let name = key.service_name();
        let manifest = self.registry.get(capability, name).ok_or_else(|| {
            DispatchError::plugin_load(
                name,
                format!("no {} plugin installed under this name", capability),
            )
        })?;
        self.loader
            .load(manifest)
            .await
            .map_err(|e| DispatchError::plugin_load(name, e))
    }

    fn unknown(capability: Capability, key: &InstanceKey) -> DispatchError {
        DispatchError::UnknownService {
            capability: capability.to_string(),
            name: key.service_name().to_string(),
        }
    }

    pub async fn translate_service(
        &self,
        key: &InstanceKey,
    ) -> Result<Arc<dyn TranslateService>, DispatchError> {
        match key.origin() {
            ServiceOrigin::Builtin => self
                .builtins
                .translate(key.service_name())
                .ok_or_else(|| Self::unknown(Capability::Translate, key)),
            ServiceOrigin::Plugin => {
                let plugin: Arc<dyn TranslateService> =
                    self.plugin(Capability::Translate, key).await?;
                Ok(plugin)
            }
        }
    }

    pub async fn tts_service(&self, key: &InstanceKey) -> Result<Arc<dyn TtsService>, DispatchError> {
        match key.origin() {
            ServiceOrigin::Builtin => self
                .builtins
                .tts(key.service_name())
                .ok_or_else(|| Self::unknown(Capability::Tts, key)),
            ServiceOrigin::Plugin => {
                let plugin: Arc<dyn TtsService> = self.plugin(Capability::Tts, key).await?;
                Ok(plugin)
            }
        }
    }

    pub async fn recognize_service(
        &self,
        key: &InstanceKey,
    ) -> Result<Arc<dyn RecognizeService>, DispatchError> {
        match key.origin() {
            ServiceOrigin::Builtin => self
                .builtins
                .recognize(key.service_name())
                .ok_or_else(|| Self::unknown(Capability::Recognize, key)),
            ServiceOrigin::Plugin => {
                let plugin: Arc<dyn RecognizeService> =
                    self.plugin(Capability::Recognize, key).await?;
                Ok(plugin)
            }
        }
    }

    pub async fn collection_service(
        &self,
        key: &InstanceKey,
    ) -> Result<Arc<dyn CollectionService>, DispatchError> {
        match key.origin() {
            ServiceOrigin::Builtin => self
                .builtins
                .collection(key.service_name())
                .ok_or_else(|| Self::unknown(Capability::Collection, key)),
            ServiceOrigin::Plugin => {
                let plugin: Arc<dyn CollectionService> =
                    self.plugin(Capability::Collection, key).await?;
                Ok(plugin)
            }
        }
    }

    /// Forward translation for one slot.
    ///
    /// The trimmed source text is sent. The returned result is not trimmed.
    pub async fn translate(
        &self,
        instance: &ServiceInstance,
        request: &TranslationRequest,
        secondary: &str,
        partial: Option<PartialSink>,
    ) -> Result<Translation, DispatchError> {
        let descriptor = self.descriptor(Capability::Translate, &instance.key)?;
        let pair = language::resolve(
            &descriptor.languages,
            &request.source,
            &request.target,
            &request.detected,
            secondary,
        )?;
        self.call_translate(instance, request.text.trim(), &pair, &request.detected, partial)
            .await
    }

    /// Translate `text` back along the reverse of `pair`
    pub async fn translate_back(
        &self,
        instance: &ServiceInstance,
        text: &str,
        pair: &LanguagePair,
        detected: &str,
        partial: Option<PartialSink>,
    ) -> Result<Translation, DispatchError> {
        let descriptor = self.descriptor(Capability::Translate, &instance.key)?;
        let reversed = language::reverse(&descriptor.languages, pair, detected)?;
        self.call_translate(instance, text.trim(), &reversed, detected, partial)
            .await
    }

    async fn call_translate(
        &self,
        instance: &ServiceInstance,
        text: &str,
        pair: &NegotiatedPair,
        detected: &str,
        partial: Option<PartialSink>,
    ) -> Result<Translation, DispatchError> {
        let service = self.translate_service(&instance.key).await?;
        let mut ctx = InvocationContext::new(instance.invocation_config()).with_detected(detected);
        if let Some(sink) = partial {
            ctx = ctx.with_partial_sink(sink);
        }

        debug!(
            "[{}] translate {} -> {}",
            instance.key, pair.native_source, pair.native_target
        );
        let result = service
            .translate(text, &pair.native_source, &pair.native_target, &ctx)
            .await;
        match &result {
            Ok(_) => info!("[{}] resolved", instance.key),
            Err(e) => info!("[{}] rejected: {}", instance.key, e),
        }

        Ok(Translation {
            result: result?,
            target: pair.target.clone(),
            service: instance.key.service_name().to_string(),
        })
    }

    /// Synthesize `text` with a TTS instance
    pub async fn speak(
        &self,
        instance: &ServiceInstance,
        text: &str,
        lang: &str,
    ) -> Result<Vec<u8>, DispatchError> {
        let descriptor = self.descriptor(Capability::Tts, &instance.key)?;
        let native = language::resolve_single(&descriptor.languages, lang)?;
        let service = self.tts_service(&instance.key).await?;
        let ctx = InvocationContext::new(instance.invocation_config());
        Ok(service.speak(text, &native, &ctx).await?)
    }

    /// Recognize text in a base64 image with a recognition instance
    pub async fn recognize(
        &self,
        instance: &ServiceInstance,
        image_base64: &str,
        lang: &str,
    ) -> Result<String, DispatchError> {
        let descriptor = self.descriptor(Capability::Recognize, &instance.key)?;
        let native = language::resolve_single(&descriptor.languages, lang)?;
        let service = self.recognize_service(&instance.key).await?;
        let ctx = InvocationContext::new(instance.invocation_config());
        Ok(service.recognize(image_base64, &native, &ctx).await?)
    }

    /// Store a source/result pair with a collection instance
    pub async fn collect(
        &self,
        instance: &ServiceInstance,
        source: &str,
        target: &str,
    ) -> Result<(), DispatchError> {
        let service = self.collection_service(&instance.key).await?;
        let ctx = InvocationContext::new(instance.invocation_config());
        Ok(service.collect(source.trim(), target, &ctx).await?)
    }
}
