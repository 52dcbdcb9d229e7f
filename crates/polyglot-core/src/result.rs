//! Translation result shapes

use crate::error::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a slot displays once a backend answers.
///
/// Partial payloads pushed while a call is in flight use the same shape as
/// the final resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TranslateResult {
    Text(String),
    Dictionary(Dictionary),
    Failure(String),
}

impl TranslateResult {
    /// Interpret a raw backend payload: strings are text, objects are
    /// dictionary entries.
    pub fn from_json(value: Value) -> ServiceResult<Self> {
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Object(_) => serde_json::from_value(value)
                .map(Self::Dictionary)
                .map_err(|e| ServiceError::InvalidResponse(e.to_string())),
            Value::Null => Ok(Self::Text(String::new())),
            other => Err(ServiceError::InvalidResponse(format!(
                "expected string or object, got {}",
                other
            ))),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Dictionary(dict) => dict.is_empty(),
            Self::Failure(_) => false,
        }
    }

    /// Text results are trimmed; other shapes pass through.
    pub fn trimmed(self) -> Self {
        match self {
            Self::Text(text) => Self::Text(text.trim().to_string()),
            other => other,
        }
    }

    /// Flat text used for clipboard writes.
    pub fn to_plain_text(&self) -> String {
        match self {
            Self::Text(text) | Self::Failure(text) => text.clone(),
            Self::Dictionary(dict) => dict.to_plain_text(),
        }
    }

    /// Text persisted to history; dictionaries are stored as JSON.
    pub fn to_history_text(&self) -> String {
        match self {
            Self::Dictionary(dict) => {
                serde_json::to_string(dict).unwrap_or_else(|_| dict.to_plain_text())
            }
            other => other.to_plain_text(),
        }
    }
}

/// Structured dictionary-style result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    #[serde(default)]
    pub pronunciations: Vec<Pronunciation>,
    #[serde(default)]
    pub explanations: Vec<Explanation>,
    #[serde(default)]
    pub associations: Vec<String>,
    #[serde(default, rename = "sentence")]
    pub sentences: Vec<Sentence>,
}

impl Dictionary {
    pub fn is_empty(&self) -> bool {
        self.pronunciations.is_empty()
            && self.explanations.is_empty()
            && self.associations.is_empty()
            && self.sentences.is_empty()
    }

    pub fn to_plain_text(&self) -> String {
        let mut lines = Vec::new();
        for p in &self.pronunciations {
            match (&p.region, &p.symbol) {
                (Some(region), Some(symbol)) => lines.push(format!("{} [{}]", region, symbol)),
                (None, Some(symbol)) => lines.push(format!("[{}]", symbol)),
                _ => {}
            }
        }
        for e in &self.explanations {
            let explains = e.explains.join("; ");
            match &e.kind {
                Some(kind) => lines.push(format!("{} {}", kind, explains)),
                None => lines.push(explains),
            }
        }
        if !self.associations.is_empty() {
            lines.push(self.associations.join("\n"));
        }
        for s in &self.sentences {
            if let Some(source) = &s.source {
                lines.push(source.clone());
            }
            if let Some(target) = &s.target {
                lines.push(target.clone());
            }
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pronunciation {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    /// Audio bytes or a URL, depending on the backend
    #[serde(default)]
    pub voice: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    #[serde(default, rename = "trait")]
    pub kind: Option<String>,
    #[serde(default)]
    pub explains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}
