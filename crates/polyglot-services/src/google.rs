//! Google Translate over the public `gtx` endpoint

use crate::http::{check_status, normalize_base, request_error};
use async_trait::async_trait;
use polyglot_core::{
    Capability, Dictionary, Explanation, InvocationContext, LanguageMap, ServiceDescriptor,
    ServiceError, ServiceResult, TranslateResult, TranslateService,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

pub const NAME: &str = "google";
const DEFAULT_BASE: &str = "https://translate.googleapis.com";

/// Instance config key overriding the endpoint host
pub const CUSTOM_URL_KEY: &str = "custom_url";

pub fn languages() -> LanguageMap {
    [
        ("auto", "auto"),
        ("zh_cn", "zh-CN"),
        ("zh_tw", "zh-TW"),
        ("en", "en"),
        ("ja", "ja"),
        ("ko", "ko"),
        ("fr", "fr"),
        ("es", "es"),
        ("ru", "ru"),
        ("de", "de"),
        ("it", "it"),
        ("tr", "tr"),
        ("pt_pt", "pt-PT"),
        ("pt_br", "pt"),
        ("vi", "vi"),
        ("id", "id"),
        ("th", "th"),
        ("ms", "ms"),
        ("ar", "ar"),
        ("hi", "hi"),
        ("mn_cy", "mn"),
        ("km", "km"),
        ("nb_no", "no"),
        ("fa", "fa"),
        ("sv", "sv"),
        ("pl", "pl"),
        ("nl", "nl"),
        ("uk", "uk"),
        ("he", "iw"),
    ]
    .into_iter()
    .collect()
}

pub struct GoogleTranslate {
    client: Client,
    descriptor: ServiceDescriptor,
}

impl GoogleTranslate {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            descriptor: ServiceDescriptor::builtin(
                Capability::Translate,
                NAME,
                "Google",
                languages(),
            )
            .with_icon("logo/google.svg"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    sentences: Vec<GoogleSentence>,
    #[serde(default)]
    dict: Vec<GoogleDictEntry>,
    #[serde(default)]
    src: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleSentence {
    #[serde(default)]
    trans: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleDictEntry {
    #[serde(default)]
    pos: String,
    #[serde(default)]
    terms: Vec<String>,
}

impl GoogleResponse {
    fn into_result(self) -> TranslateResult {
        if !self.dict.is_empty() {
            let explanations = self
                .dict
                .into_iter()
                .map(|entry| Explanation {
                    kind: Some(entry.pos).filter(|p| !p.is_empty()),
                    explains: entry.terms,
                })
                .collect();
            return TranslateResult::Dictionary(Dictionary {
                explanations,
                ..Default::default()
            });
        }
        let text: String = self.sentences.into_iter().filter_map(|s| s.trans).collect();
        TranslateResult::Text(text)
    }
}

#[async_trait]
impl TranslateService for GoogleTranslate {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        ctx: &InvocationContext,
    ) -> ServiceResult<TranslateResult> {
        let base = ctx
            .config_str(CUSTOM_URL_KEY)
            .map(normalize_base)
            .unwrap_or_else(|| DEFAULT_BASE.to_string());
        let url = format!(
            "{}/translate_a/single?client=gtx&sl={}&tl={}&hl={}&dt=t&dt=bd&dj=1&ie=UTF-8&oe=UTF-8&q={}",
            base,
            from,
            to,
            to,
            urlencoding::encode(text)
        );

        let response = self.client.get(&url).send().await.map_err(request_error)?;
        let body: GoogleResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        if let Some(src) = &body.src {
            debug!("Google detected source language: {}", src);
        }
        Ok(body.into_result())
    }
}
