//! Core types for Polyglot
//!
//! Everything the dispatch layer needs to talk about backends without knowing
//! how they are implemented:
//!
//! - **Data model**: capabilities, descriptors, instance keys and results
//! - **Language negotiation**: abstract tag to native code resolution
//! - **Service contracts**: one async trait per capability, shared by builtin
//!   and plugin backends
//! - **Errors**: the slot-local failure taxonomy
//!
//! ## Example
//!
//! ```rust
//! use polyglot_core::{language, LanguageMap};
//!
//! let map: LanguageMap = [("auto", "auto"), ("en", "en"), ("zh_cn", "zh")]
//!     .into_iter()
//!     .collect();
//!
//! let pair = language::resolve(&map, "auto", "en", "en", "zh_cn").unwrap();
//! assert_eq!(pair.native_target, "zh");
//! ```

pub mod error;
pub mod language;
pub mod registry;
pub mod result;
pub mod service;
pub mod text;
pub mod types;

pub use error::{DispatchError, InstanceKeyError, ServiceError, ServiceResult};
pub use language::{LanguagePair, NegotiatedPair, AUTO};
pub use registry::{Registry, RegistryBuilder};
pub use result::{Dictionary, Explanation, Pronunciation, Sentence, TranslateResult};
pub use service::{
    CollectionService, InvocationContext, PartialSink, RecognizeService, TranslateService,
    TtsService,
};
pub use text::clean_text;
pub use types::{
    Capability, InstanceKey, LanguageMap, ServiceDescriptor, ServiceInstance, ServiceOrigin,
    INSTANCE_NAME_CONFIG_KEY, PLUGIN_PREFIX,
};
