//! Lingva translate and speech backends
//!
//! Lingva is a self-hostable Google Translate frontend. Instances point at a
//! server with the `requestPath` config key.

use crate::http::{check_status, normalize_base, request_error};
use async_trait::async_trait;
use polyglot_core::{
    Capability, InvocationContext, LanguageMap, ServiceDescriptor, ServiceError, ServiceResult,
    TranslateResult, TranslateService, TtsService,
};
use reqwest::Client;
use serde::Deserialize;

pub const TRANSLATE_NAME: &str = "lingva";
pub const TTS_NAME: &str = "lingva_tts";

/// Instance config key holding the server host or URL
pub const REQUEST_PATH_KEY: &str = "requestPath";
const DEFAULT_HOST: &str = "lingva.pot-app.com";

pub fn languages() -> LanguageMap {
    [
        ("auto", "auto"),
        ("zh_cn", "zh"),
        ("zh_tw", "zh_HANT"),
        ("en", "en"),
        ("ja", "ja"),
        ("ko", "ko"),
        ("fr", "fr"),
        ("es", "es"),
        ("ru", "ru"),
        ("de", "de"),
        ("it", "it"),
        ("tr", "tr"),
        ("pt_pt", "pt"),
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

fn base_url(ctx: &InvocationContext) -> String {
    normalize_base(ctx.config_str(REQUEST_PATH_KEY).unwrap_or(DEFAULT_HOST))
}

pub struct LingvaTranslate {
    client: Client,
    descriptor: ServiceDescriptor,
}

impl LingvaTranslate {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            descriptor: ServiceDescriptor::builtin(
                Capability::Translate,
                TRANSLATE_NAME,
                "Lingva",
                languages(),
            )
            .with_icon("logo/lingva.svg"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    translation: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl TranslateService for LingvaTranslate {
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
        let url = format!(
            "{}/api/v1/{}/{}/{}",
            base_url(ctx),
            from,
            to,
            urlencoding::encode(text)
        );

        let response = self.client.get(&url).send().await.map_err(request_error)?;
        let body: TranslationResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        match (body.translation, body.error) {
            (Some(translation), _) => Ok(TranslateResult::Text(translation)),
            (None, Some(error)) => Err(ServiceError::Backend(error)),
            (None, None) => Err(ServiceError::InvalidResponse(
                "missing translation".to_string(),
            )),
        }
    }
}

pub struct LingvaTts {
    client: Client,
    descriptor: ServiceDescriptor,
}

impl LingvaTts {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            descriptor: ServiceDescriptor::builtin(Capability::Tts, TTS_NAME, "Lingva", languages())
                .with_icon("logo/lingva.svg"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AudioResponse {
    audio: Option<Vec<u8>>,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl TtsService for LingvaTts {
    fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    async fn speak(&self, text: &str, lang: &str, ctx: &InvocationContext) -> ServiceResult<Vec<u8>> {
        let url = format!(
            "{}/api/v1/audio/{}/{}",
            base_url(ctx),
            lang,
            urlencoding::encode(text)
        );

        let response = self.client.get(&url).send().await.map_err(request_error)?;
        let body: AudioResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        match (body.audio, body.error) {
            (Some(audio), _) => Ok(audio),
            (None, Some(error)) => Err(ServiceError::Backend(error)),
            (None, None) => Err(ServiceError::InvalidResponse("missing audio".to_string())),
        }
    }
}
