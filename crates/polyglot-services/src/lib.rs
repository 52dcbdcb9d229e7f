//! Builtin backends for Polyglot
//!
//! The builtin table is fixed at build time. Names here are the service names
//! used in instance keys (`google`, `lingva@mirror`, ...).

pub mod google;
mod http;
pub mod lingva;

pub use google::GoogleTranslate;
pub use lingva::{LingvaTranslate, LingvaTts};

use polyglot_core::{
    Capability, CollectionService, RecognizeService, ServiceDescriptor, TranslateService,
    TtsService,
};
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Static lookup of compiled-in backends by capability and name
#[derive(Clone)]
pub struct Builtins {
    translate: BTreeMap<&'static str, Arc<dyn TranslateService>>,
    tts: BTreeMap<&'static str, Arc<dyn TtsService>>,
    recognize: BTreeMap<&'static str, Arc<dyn RecognizeService>>,
    collection: BTreeMap<&'static str, Arc<dyn CollectionService>>,
}

impl std::fmt::Debug for Builtins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtins")
            .field("translate", &self.translate.keys().collect::<Vec<_>>())
            .field("tts", &self.tts.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Builtins {
    pub fn new(client: Client) -> Self {
        let mut translate: BTreeMap<&'static str, Arc<dyn TranslateService>> = BTreeMap::new();
        translate.insert(google::NAME, Arc::new(GoogleTranslate::new(client.clone())));
        translate.insert(
            lingva::TRANSLATE_NAME,
            Arc::new(LingvaTranslate::new(client.clone())),
        );

        let mut tts: BTreeMap<&'static str, Arc<dyn TtsService>> = BTreeMap::new();
        tts.insert(lingva::TTS_NAME, Arc::new(LingvaTts::new(client)));

        Self {
            translate,
            tts,
            recognize: BTreeMap::new(),
            collection: BTreeMap::new(),
        }
    }

    /// An empty table, for callers that register their own backends
    pub fn empty() -> Self {
        Self {
            translate: BTreeMap::new(),
            tts: BTreeMap::new(),
            recognize: BTreeMap::new(),
            collection: BTreeMap::new(),
        }
    }

    pub fn with_translate(mut self, name: &'static str, service: Arc<dyn TranslateService>) -> Self {
        self.translate.insert(name, service);
        self
    }

    pub fn with_tts(mut self, name: &'static str, service: Arc<dyn TtsService>) -> Self {
        self.tts.insert(name, service);
        self
    }

    pub fn with_recognize(mut self, name: &'static str, service: Arc<dyn RecognizeService>) -> Self {
        self.recognize.insert(name, service);
        self
    }

    pub fn with_collection(
        mut self,
        name: &'static str,
        service: Arc<dyn CollectionService>,
    ) -> Self {
        self.collection.insert(name, service);
        self
    }

    pub fn translate(&self, name: &str) -> Option<Arc<dyn TranslateService>> {
        self.translate.get(name).cloned()
    }

    pub fn tts(&self, name: &str) -> Option<Arc<dyn TtsService>> {
        self.tts.get(name).cloned()
    }

    pub fn recognize(&self, name: &str) -> Option<Arc<dyn RecognizeService>> {
        self.recognize.get(name).cloned()
    }

    pub fn collection(&self, name: &str) -> Option<Arc<dyn CollectionService>> {
        self.collection.get(name).cloned()
    }

    /// Descriptor of the builtin `name` for `capability`
    pub fn descriptor(&self, capability: Capability, name: &str) -> Option<ServiceDescriptor> {
        match capability {
            Capability::Translate => self.translate.get(name).map(|s| s.descriptor().clone()),
            Capability::Tts => self.tts.get(name).map(|s| s.descriptor().clone()),
            Capability::Recognize => self.recognize.get(name).map(|s| s.descriptor().clone()),
            Capability::Collection => self.collection.get(name).map(|s| s.descriptor().clone()),
        }
    }

    /// All builtin descriptors for `capability`, sorted by name
    pub fn descriptors(&self, capability: Capability) -> Vec<ServiceDescriptor> {
        match capability {
            Capability::Translate => self.translate.values().map(|s| s.descriptor().clone()).collect(),
            Capability::Tts => self.tts.values().map(|s| s.descriptor().clone()).collect(),
            Capability::Recognize => self.recognize.values().map(|s| s.descriptor().clone()).collect(),
            Capability::Collection => self
                .collection
                .values()
                .map(|s| s.descriptor().clone())
                .collect(),
        }
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new(Client::new())
    }
}
