//! Lazy, once-per-manifest plugin loading
//!
//! The first call for a `(capability, name)` pair reads the entry script and
//! checks it defines the capability function. The loaded handle is cached for
//! the process lifetime and shared by every later call. If a registry reload
//! produces a different manifest for the same name, the next call loads the
//! new bundle instead.

use crate::manifest::PluginManifest;
use crate::runtime::{self, CallArgs, CallEnv};
use crate::{PluginError, PluginResult};
use async_trait::async_trait;
use dashmap::DashMap;
use polyglot_core::{
    Capability, CollectionService, InvocationContext, RecognizeService, ServiceDescriptor,
    ServiceError, ServiceResult, TranslateResult, TranslateService, TtsService,
};
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::OnceCell;
use tokio::task::spawn_blocking;
use tracing::{debug, info};

/// A plugin whose entry script has been read and verified.
///
/// Lua state is created per call inside `spawn_blocking`, so only the source
/// is kept here.
pub struct PluginService {
    manifest: Arc<PluginManifest>,
    descriptor: ServiceDescriptor,
    source: Arc<str>,
    chunk_name: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for PluginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginService")
            .field("name", &self.manifest.name)
            .field("capability", &self.manifest.capability)
            .field("entry", &self.manifest.entry)
            .finish()
    }
}

impl PluginService {
    async fn load(manifest: Arc<PluginManifest>, http: reqwest::Client) -> PluginResult<Self> {
        let source = tokio::fs::read_to_string(&manifest.entry)
            .await
            .map_err(|source| PluginError::Io {
                path: manifest.entry.clone(),
                source,
            })?;
        let source: Arc<str> = Arc::from(source);

        let chunk_name = manifest
            .entry
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("main.lua")
            .to_string();
        let function = manifest.capability.as_str();

        let verify_source = source.clone();
        let verify_chunk = chunk_name.clone();
        spawn_blocking(move || runtime::verify_entry(&verify_source, &verify_chunk, function))
            .await
            .map_err(|e| PluginError::Join(e.to_string()))??;

        info!("Loaded {} plugin: {}", manifest.capability, manifest.name);
        Ok(Self {
            descriptor: manifest.descriptor(),
            manifest,
            source,
            chunk_name,
            http,
        })
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    async fn call(&self, args: CallArgs, ctx: &InvocationContext) -> ServiceResult<JsonValue> {
        let env = CallEnv {
            config: ctx.config.clone(),
            detected: ctx.detected.clone(),
            partial: ctx.partial_sink(),
            http: self.http.clone(),
            handle: Handle::try_current().ok(),
        };
        let source = self.source.clone();
        let chunk_name = self.chunk_name.clone();
        let function = self.manifest.capability.as_str();

        spawn_blocking(move || runtime::call_entry(&source, &chunk_name, function, args, env))
            .await
            .map_err(|e| ServiceError::Script(format!("plugin task failed: {}", e)))?
            .map_err(|e| ServiceError::Script(e.to_string()))
    }
}

#[async_trait]
impl TranslateService for PluginService {
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
        let args = CallArgs::Pair(text.to_string(), from.to_string(), to.to_string());
        TranslateResult::from_json(self.call(args, ctx).await?)
    }
}

#[async_trait]
impl TtsService for PluginService {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    async fn speak(&self, text: &str, lang: &str, ctx: &InvocationContext) -> ServiceResult<Vec<u8>> {
        let args = CallArgs::Single(text.to_string(), lang.to_string());
        match self.call(args, ctx).await? {
            JsonValue::String(s) => Ok(s.into_bytes()),
            JsonValue::Array(items) => items
                .iter()
                .map(|v| {
                    v.as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| ServiceError::InvalidResponse(format!("not a byte: {}", v)))
                })
                .collect(),
            other => Err(ServiceError::InvalidResponse(format!(
                "expected audio bytes, got {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl RecognizeService for PluginService {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    async fn recognize(
        &self,
        image_base64: &str,
        lang: &str,
        ctx: &InvocationContext,
    ) -> ServiceResult<String> {
        let args = CallArgs::Single(image_base64.to_string(), lang.to_string());
        match self.call(args, ctx).await? {
            JsonValue::String(s) => Ok(s.trim().to_string()),
            other => Err(ServiceError::InvalidResponse(format!(
                "expected text, got {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl CollectionService for PluginService {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    async fn collect(&self, source: &str, target: &str, ctx: &InvocationContext) -> ServiceResult<()> {
        let args = CallArgs::Collect(source.to_string(), target.to_string());
        self.call(args, ctx).await.map(|_| ())
    }
}

struct CacheSlot {
    manifest: Arc<PluginManifest>,
    cell: OnceCell<Arc<PluginService>>,
}

impl CacheSlot {
    fn new(manifest: Arc<PluginManifest>) -> Self {
        Self {
            manifest,
            cell: OnceCell::new(),
        }
    }
}

/// Process-wide cache of loaded plugins
pub struct PluginLoader {
    cache: DashMap<(Capability, String), Arc<CacheSlot>>,
    http: reqwest::Client,
    loads: AtomicUsize,
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl std::fmt::Debug for PluginLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginLoader")
            .field("cached", &self.cache.len())
            .field("loads", &self.load_count())
            .finish()
    }
}

impl PluginLoader {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            cache: DashMap::new(),
            http,
            loads: AtomicUsize::new(0),
        }
    }

    /// Return the loaded plugin for `manifest`, loading it on first use.
    ///
    /// Concurrent first calls share a single load. A failed load is not
    /// cached, so a later call tries again.
    pub async fn load(&self, manifest: Arc<PluginManifest>) -> PluginResult<Arc<PluginService>> {
        let key = (manifest.capability, manifest.name.clone());
        let slot = {
            let mut entry = self
                .cache
                .entry(key)
                .or_insert_with(|| Arc::new(CacheSlot::new(manifest.clone())));
            if *entry.manifest != *manifest {
                debug!("Manifest changed for plugin {}, reloading", manifest.name);
                *entry = Arc::new(CacheSlot::new(manifest.clone()));
            }
            entry.value().clone()
        };

        slot.cell
            .get_or_try_init(|| async {
                self.loads.fetch_add(1, Ordering::Relaxed);
                PluginService::load(manifest.clone(), self.http.clone())
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }

    /// Number of load attempts performed
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}
