//! Source text normalization

use regex::Regex;
use std::sync::LazyLock;

static HYPHEN_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\s+").expect("hyphen break regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Trim `text`, optionally joining hyphenated line breaks and collapsing
/// whitespace runs into single spaces.
pub fn clean_text(text: &str, delete_newline: bool) -> String {
    let text = text.trim();
    if !delete_newline {
        return text.to_string();
    }
    let joined = HYPHEN_BREAK_RE.replace_all(text, "");
    WHITESPACE_RE.replace_all(&joined, " ").into_owned()
}
