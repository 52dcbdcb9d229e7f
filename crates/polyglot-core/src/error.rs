//! Error taxonomy shared across the dispatch layer

use thiserror::Error;

/// Why a single slot dispatch did not produce a committed result.
///
/// Every variant is local to one slot. None of them affect other slots or
/// the registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// An abstract tag is absent from the backend's language map
    #[error("Language not supported: {tag}")]
    LanguageUnsupported {
        /// The tag that failed to resolve
        tag: String,
    },

    /// The plugin manifest or entry script could not be resolved
    #[error("Failed to load plugin {name}: {reason}")]
    PluginLoadFailure {
        /// Plugin id
        name: String,
        /// Loader message
        reason: String,
    },

    /// No builtin or plugin is registered under this name
    #[error("Unknown {capability} service: {name}")]
    UnknownService {
        /// Capability the lookup was made for
        capability: String,
        /// Service name with instance prefix and suffix stripped
        name: String,
    },

    /// The backend rejected the request; the reason is shown verbatim
    #[error("{0}")]
    BackendFailure(String),

    /// A result arrived for a superseded generation and was dropped
    #[error("Stale result for generation {generation}")]
    StaleResult {
        /// Generation the result was tagged with
        generation: u64,
    },
}

impl DispatchError {
    pub fn unsupported(tag: impl Into<String>) -> Self {
        Self::LanguageUnsupported { tag: tag.into() }
    }

    pub fn plugin_load(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::PluginLoadFailure {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether a manual retry can reasonably change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendFailure(_))
    }
}

impl From<ServiceError> for DispatchError {
    fn from(err: ServiceError) -> Self {
        Self::BackendFailure(err.to_string())
    }
}

/// Errors raised by a backend while serving a call.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("{0}")]
    Script(String),

    #[error("{0}")]
    Backend(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstanceKeyError {
    #[error("Instance key is empty")]
    Empty,

    #[error("Instance key has an empty service name: {0}")]
    EmptyName(String),

    #[error("Instance key has an empty suffix: {0}")]
    EmptySuffix(String),

    #[error("Instance key contains invalid characters: {0}")]
    InvalidCharacters(String),
}
