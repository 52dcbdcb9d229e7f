//! # Polyglot Configuration
//!
//! TOML configuration for translation defaults, per-capability instance
//! lists and per-instance settings, plus a [`ConfigStore`] that hands out
//! immutable snapshots.
//!
//! ```rust,no_run
//! use polyglot_config::ConfigStore;
//!
//! let store = ConfigStore::load(ConfigStore::default_path())?;
//! let config = store.snapshot();
//! println!("target language: {}", config.translate.target_language);
//! # Ok::<(), polyglot_config::ConfigError>(())
//! ```

#![warn(missing_docs)]

mod config;
mod store;

pub use config::*;
pub use store::*;
