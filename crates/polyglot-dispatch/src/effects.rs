//! Outbound signals
//!
//! The coordinator never touches the clipboard, a window or the history
//! database. It emits [`Effect`]s and leaves them to whoever drains the
//! channel.

use polyglot_core::TranslateResult;
use serde::Serialize;

/// Title used for clipboard notifications
pub const CLIPBOARD_NOTIFY_TITLE: &str = "Copied to clipboard";

/// Row handed to the history sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    /// Trimmed source text
    pub text: String,
    /// Detected source language
    pub source: String,
    /// Effective target language
    pub target: String,
    pub service: String,
    pub result: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// A slot started a dispatch and collapsed its result area
    Loading { slot: usize, generation: u64 },
    Partial {
        slot: usize,
        generation: u64,
        result: TranslateResult,
    },
    Settled {
        slot: usize,
        generation: u64,
        result: TranslateResult,
    },
    Failed {
        slot: usize,
        generation: u64,
        reason: String,
    },
    /// Emitted at most once per dispatch
    Uncollapse { slot: usize, generation: u64 },
    /// Slot returned to idle with no result
    Cleared { slot: usize },
    ClipboardWrite(String),
    Notify { title: String, body: String },
    AppendHistory(HistoryRecord),
}

impl Effect {
    /// Slot this effect belongs to, if any
    pub fn slot(&self) -> Option<usize> {
        match self {
            Self::Loading { slot, .. }
            | Self::Partial { slot, .. }
            | Self::Settled { slot, .. }
            | Self::Failed { slot, .. }
            | Self::Uncollapse { slot, .. }
            | Self::Cleared { slot } => Some(*slot),
            Self::ClipboardWrite(_) | Self::Notify { .. } | Self::AppendHistory(_) => None,
        }
    }

    /// Whether this effect ends a dispatch for its slot
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Settled { .. } | Self::Failed { .. } | Self::Cleared { .. }
        )
    }

    pub(crate) fn clipboard_notification(body: impl Into<String>) -> Self {
        Self::Notify {
            title: CLIPBOARD_NOTIFY_TITLE.to_string(),
            body: body.into(),
        }
    }
}
