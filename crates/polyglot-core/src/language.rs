//! Language negotiation between abstract tags and backend-native codes
//!
//! Every backend declares a [`LanguageMap`]. A request is only sent if both
//! tags of the (possibly substituted) pair resolve in that map.

use crate::error::DispatchError;
use crate::types::LanguageMap;

/// Auto-detect sentinel tag.
pub const AUTO: &str = "auto";

/// Abstract tags the application knows about.
pub const KNOWN_TAGS: &[&str] = &[
    AUTO, "zh_cn", "zh_tw", "yue", "en", "ja", "ko", "fr", "es", "ru", "de", "it", "tr", "pt_pt",
    "pt_br", "vi", "id", "th", "ms", "ar", "hi", "mn_cy", "mn_mo", "km", "nb_no", "nn_no", "fa",
    "sv", "pl", "nl", "uk", "he",
];

pub fn is_known_tag(tag: &str) -> bool {
    KNOWN_TAGS.contains(&tag)
}

/// Abstract source/target pair as selected by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn is_auto_source(&self) -> bool {
        self.source == AUTO
    }

    /// Pair used to translate a result back toward its origin.
    ///
    /// With an auto source the reversed pair is `(auto, detected)`; otherwise
    /// the tags are swapped.
    pub fn reversed(&self, detected: &str) -> Self {
        if self.is_auto_source() {
            Self::new(AUTO, detected)
        } else {
            Self::new(self.target.clone(), self.source.clone())
        }
    }
}

/// Outcome of negotiating a pair against one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedPair {
    /// Abstract source tag
    pub source: String,
    /// Effective abstract target, after secondary-language substitution
    pub target: String,
    pub native_source: String,
    pub native_target: String,
}

fn lookup(map: &LanguageMap, tag: &str) -> Result<String, DispatchError> {
    map.get(tag)
        .map(str::to_string)
        .ok_or_else(|| DispatchError::unsupported(tag))
}

/// Resolve a forward translation pair.
///
/// Both tags must exist in `map`. When the source is [`AUTO`] and the target
/// equals the detected language, `secondary` becomes the effective target and
/// must exist in `map` too.
pub fn resolve(
    map: &LanguageMap,
    source: &str,
    target: &str,
    detected: &str,
    secondary: &str,
) -> Result<NegotiatedPair, DispatchError> {
    let native_source = lookup(map, source)?;
    lookup(map, target)?;

    let effective_target = if source == AUTO && !detected.is_empty() && target == detected {
        secondary
    } else {
        target
    };
    let native_target = lookup(map, effective_target)?;

    Ok(NegotiatedPair {
        source: source.to_string(),
        target: effective_target.to_string(),
        native_source,
        native_target,
    })
}

/// Resolve the translate-back pair for a result produced with `pair`.
pub fn reverse(
    map: &LanguageMap,
    pair: &LanguagePair,
    detected: &str,
) -> Result<NegotiatedPair, DispatchError> {
    let reversed = pair.reversed(detected);
    let native_source = lookup(map, &reversed.source)?;
    let native_target = lookup(map, &reversed.target)?;

    Ok(NegotiatedPair {
        source: reversed.source,
        target: reversed.target,
        native_source,
        native_target,
    })
}

/// Resolve a single tag, as used by speech and recognition backends.
pub fn resolve_single(map: &LanguageMap, tag: &str) -> Result<String, DispatchError> {
    lookup(map, tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baidu() -> LanguageMap {
        [
            ("auto", "auto"),
            ("zh_cn", "zh"),
            ("zh_tw", "cht"),
            ("en", "en"),
            ("ja", "jp"),
            ("ko", "kor"),
            ("fr", "fra"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_resolve_maps_native_codes() {
        let pair = resolve(&baidu(), "ja", "fr", "", "en").unwrap();
        assert_eq!(pair.native_source, "jp");
        assert_eq!(pair.native_target, "fra");
        assert_eq!(pair.target, "fr");
    }

    #[test]
    fn test_resolve_rejects_missing_source() {
        let err = resolve(&baidu(), "de", "en", "", "en").unwrap_err();
        assert_eq!(err, DispatchError::unsupported("de"));
    }

    #[test]
    fn test_resolve_rejects_missing_target() {
        let err = resolve(&baidu(), "auto", "ru", "en", "en").unwrap_err();
        assert_eq!(err, DispatchError::unsupported("ru"));
    }

    #[test]
    fn test_auto_source_matching_detected_uses_secondary() {
        let pair = resolve(&baidu(), "auto", "zh_cn", "zh_cn", "en").unwrap();
        assert_eq!(pair.target, "en");
        assert_eq!(pair.native_target, "en");
        assert_eq!(pair.native_source, "auto");
    }

    #[test]
    fn test_secondary_substitution_only_applies_to_auto_source() {
        let pair = resolve(&baidu(), "ja", "zh_cn", "zh_cn", "en").unwrap();
        assert_eq!(pair.target, "zh_cn");
    }

    #[test]
    fn test_substituted_secondary_must_be_supported() {
        let err = resolve(&baidu(), "auto", "en", "en", "ru").unwrap_err();
        assert_eq!(err, DispatchError::unsupported("ru"));
    }

    #[test]
    fn test_empty_detected_never_substitutes() {
        let pair = resolve(&baidu(), "auto", "en", "", "zh_cn").unwrap();
        assert_eq!(pair.target, "en");
    }

    #[test]
    fn test_reverse_swaps_explicit_pair() {
        let pair = LanguagePair::new("zh_cn", "fr");
        let back = reverse(&baidu(), &pair, "").unwrap();
        assert_eq!(back.source, "fr");
        assert_eq!(back.target, "zh_cn");
        assert_eq!(back.native_source, "fra");
        assert_eq!(back.native_target, "zh");
    }

    #[test]
    fn test_reverse_auto_targets_detected_language() {
        let pair = LanguagePair::new("auto", "fr");
        let back = reverse(&baidu(), &pair, "en").unwrap();
        assert_eq!(back.target, "en");
        assert_eq!(back.source, AUTO);
        assert_ne!(back.target, AUTO);
    }

    #[test]
    fn test_reverse_auto_without_detection_is_unsupported() {
        let pair = LanguagePair::new("auto", "fr");
        let err = reverse(&baidu(), &pair, "").unwrap_err();
        assert_eq!(err, DispatchError::unsupported(""));
    }

    #[test]
    fn test_reverse_checks_swapped_pair() {
        let map: LanguageMap = [("auto", "auto"), ("en", "en")].into_iter().collect();
        let pair = LanguagePair::new("auto", "en");
        assert!(reverse(&map, &pair, "fr").is_err());
    }

    #[test]
    fn test_resolve_single() {
        assert_eq!(resolve_single(&baidu(), "ko").unwrap(), "kor");
        assert!(resolve_single(&baidu(), "xx").is_err());
    }

    #[test]
    fn test_known_tags() {
        assert!(is_known_tag("auto"));
        assert!(is_known_tag("pt_br"));
        assert!(!is_known_tag("klingon"));
    }
}
