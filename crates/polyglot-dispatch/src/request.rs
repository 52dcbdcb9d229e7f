//! Request parameters carried from the coordinator into slots

use polyglot_core::{LanguagePair, TranslateResult};

/// The current source text and language selection.
///
/// Shared by every slot of one dispatch round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    pub text: String,
    pub pair: LanguagePair,
    /// Detected source language, empty if unknown
    pub detected: String,
}

impl SourceInput {
    pub fn new(text: impl Into<String>, pair: LanguagePair, detected: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pair,
            detected: detected.into(),
        }
    }

    /// Non-empty trimmed text and both languages set
    pub fn is_dispatchable(&self) -> bool {
        !self.text.trim().is_empty() && !self.pair.source.is_empty() && !self.pair.target.is_empty()
    }
}

/// One forward dispatch for one slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub slot: usize,
    pub generation: u64,
    pub text: String,
    pub source: String,
    pub target: String,
    pub detected: String,
}

impl TranslationRequest {
    pub fn new(slot: usize, generation: u64, input: &SourceInput) -> Self {
        Self {
            slot,
            generation,
            text: input.text.clone(),
            source: input.pair.source.clone(),
            target: input.pair.target.clone(),
            detected: input.detected.clone(),
        }
    }
}

/// A resolved backend answer
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub result: TranslateResult,
    /// Effective abstract target after secondary-language substitution
    pub target: String,
    /// Service name without origin prefix or instance suffix
    pub service: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatchable_requires_text_and_languages() {
        let pair = LanguagePair::new("auto", "en");
        assert!(SourceInput::new("hi", pair.clone(), "").is_dispatchable());
        assert!(!SourceInput::new("  \n", pair, "").is_dispatchable());
        assert!(!SourceInput::new("hi", LanguagePair::new("auto", ""), "").is_dispatchable());
    }

    #[test]
    fn test_request_copies_input() {
        let input = SourceInput::new(" hello ", LanguagePair::new("en", "fr"), "en");
        let request = TranslationRequest::new(2, 7, &input);
        assert_eq!(request.slot, 2);
        assert_eq!(request.generation, 7);
        assert_eq!(request.text, " hello ");
        assert_eq!(request.target, "fr");
    }
}
