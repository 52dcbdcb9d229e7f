//! Subscriber setup
//!
//! Logs always go to stderr; stdout carries results only.

use crate::cli::LogLevel;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Build the filter from flags, falling back to `RUST_LOG`, then `warn`
pub fn env_filter(log_level: Option<LogLevel>, verbose: bool) -> EnvFilter {
    let explicit = match (log_level, verbose) {
        (Some(level), _) => Some(LevelFilter::from(level)),
        (None, true) => Some(LevelFilter::DEBUG),
        (None, false) => None,
    };

    match explicit {
        Some(level) => EnvFilter::default().add_directive(level.into()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::WARN.into())),
    }
}

pub fn init(log_level: Option<LogLevel>, verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level, verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
