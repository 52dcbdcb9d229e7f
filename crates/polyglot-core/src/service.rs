//! Service contracts shared by builtin and plugin backends
//!
//! The dispatch layer only ever sees these traits. Whether a call lands in a
//! compiled HTTP client or a Lua script is decided when the service handle is
//! resolved, not at the call site.

use crate::error::ServiceResult;
use crate::result::TranslateResult;
use crate::types::ServiceDescriptor;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Receives incremental results while a call is in flight.
pub type PartialSink = Arc<dyn Fn(TranslateResult) + Send + Sync>;

/// Per-call context handed to a backend.
#[derive(Clone, Default)]
pub struct InvocationContext {
    /// Instance configuration blob
    pub config: Map<String, Value>,
    /// Detected source language, empty if unknown
    pub detected: String,
    on_partial: Option<PartialSink>,
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("config", &self.config)
            .field("detected", &self.detected)
            .field("has_partial_sink", &self.on_partial.is_some())
            .finish()
    }
}

impl InvocationContext {
    pub fn new(config: Map<String, Value>) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_detected(mut self, detected: impl Into<String>) -> Self {
        self.detected = detected.into();
        self
    }

    pub fn with_partial_sink(mut self, sink: PartialSink) -> Self {
        self.on_partial = Some(sink);
        self
    }

    pub fn has_partial_sink(&self) -> bool {
        self.on_partial.is_some()
    }

    pub fn partial_sink(&self) -> Option<PartialSink> {
        self.on_partial.clone()
    }

    /// Push an incremental result. A no-op when nobody is listening.
    pub fn emit_partial(&self, result: TranslateResult) {
        if let Some(sink) = &self.on_partial {
            sink(result);
        }
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

#[async_trait]
pub trait TranslateService: Send + Sync {
    fn descriptor(&self) -> &ServiceDescriptor;

    /// Translate `text` between backend-native language codes.
    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        ctx: &InvocationContext,
    ) -> ServiceResult<TranslateResult>;
}

#[async_trait]
pub trait TtsService: Send + Sync {
    fn descriptor(&self) -> &ServiceDescriptor;

    /// Synthesize speech, returning encoded audio bytes.
    async fn speak(&self, text: &str, lang: &str, ctx: &InvocationContext)
        -> ServiceResult<Vec<u8>>;
}

#[async_trait]
pub trait RecognizeService: Send + Sync {
    fn descriptor(&self) -> &ServiceDescriptor;

    /// Recognize text in a base64-encoded image.
    async fn recognize(
        &self,
        image_base64: &str,
        lang: &str,
        ctx: &InvocationContext,
    ) -> ServiceResult<String>;
}

#[async_trait]
pub trait CollectionService: Send + Sync {
    fn descriptor(&self) -> &ServiceDescriptor;

    /// Store a source/result pair in an external collection.
    async fn collect(&self, source: &str, target: &str, ctx: &InvocationContext)
        -> ServiceResult<()>;
}
