use clap::{Parser, Subcommand, ValueEnum};
use polyglot_core::Capability;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors (default)
    Warn,
    /// Informational messages
    Info,
    /// Debug messages (default for verbose)
    Debug,
    /// Trace-level messages, including dropped stale results
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser)]
#[command(name = "pgl")]
#[command(about = "pgl - translate with every configured backend at once")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses RUST_LOG or defaults to 'warn'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/polyglot/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate text with every enabled translate instance
    Translate {
        /// Text to translate (reads stdin if omitted)
        text: Option<String>,

        /// Abstract source language (overrides config)
        #[arg(short, long)]
        from: Option<String>,

        /// Abstract target language (overrides config)
        #[arg(short, long)]
        to: Option<String>,

        /// Detected source language, used for auto source substitution
        #[arg(short, long, default_value = "")]
        detected: String,

        /// Translate each result back toward the source after it settles
        #[arg(long)]
        back: bool,

        /// Print every effect as a JSON line instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Synthesize speech with the primary TTS instance
    Speak {
        /// Text to speak
        text: String,

        /// Abstract language tag
        #[arg(short, long)]
        lang: String,

        /// Output file for the audio bytes
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Recognize text in an image with the primary recognition instance
    Recognize {
        /// Image file
        image: PathBuf,

        /// Abstract language tag
        #[arg(short, long, default_value = "auto")]
        lang: String,
    },

    /// Store a source/result pair with every collection instance
    Collect {
        source: String,
        result: String,
    },

    /// List discovered plugins
    Plugins {
        /// Only show one capability
        #[arg(short, long)]
        capability: Option<Capability>,
    },

    /// Show or clear translation history
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Delete all history entries
        #[arg(long)]
        clear: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init {
        /// Overwrite existing config file
        #[arg(short = 'F', long)]
        force: bool,
    },

    /// Show the current effective configuration
    Show {
        /// Output format (toml, json)
        #[arg(short = 'f', long, default_value = "toml")]
        format: String,
    },

    /// Print the config file path
    Path,
}
