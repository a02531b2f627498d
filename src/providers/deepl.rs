use async_trait::async_trait;
use log::error;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::app_config::EngineKind;
use crate::errors::EngineError;
use crate::language_utils;
use crate::providers::{classify_request_error, classify_status, TranslationEngine, TranslationUnit};

/// DeepL's "quota exceeded" status code
const QUOTA_EXCEEDED: u16 = 456;

/// DeepL client for interacting with the DeepL API
#[derive(Debug, Clone)]
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, derived from the key type when empty)
    endpoint: String,
}

/// DeepL translate response
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    /// One translation per submitted text
    pub translations: Vec<DeepLTranslation>,
}

/// Individual translation in a DeepL response
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    /// Language DeepL detected for the source
    #[serde(default)]
    pub detected_source_language: Option<String>,
    /// The translated text
    pub text: String,
}

impl DeepL {
    /// Create a new DeepL client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Translate endpoint; free-tier keys end in ":fx" and use a separate host
    pub fn api_url(&self) -> String {
        let base = if !self.endpoint.is_empty() {
            self.endpoint.trim_end_matches('/').to_string()
        } else if self.api_key.ends_with(":fx") {
            "https://api-free.deepl.com".to_string()
        } else {
            "https://api.deepl.com".to_string()
        };
        format!("{}/v2/translate", base)
    }

    /// DeepL expects upper-case codes and no source for auto-detection
    fn source_param(code: &str) -> Option<String> {
        if language_utils::is_auto(code) {
            None
        } else {
            Some(code.trim().to_uppercase())
        }
    }

    /// Extract text from a DeepL response
    pub fn extract_text_from_response(response: DeepLResponse) -> Result<String, EngineError> {
        response
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| EngineError::Transient("DeepL returned no translations".to_string()))
    }
}

#[async_trait]
impl TranslationEngine for DeepL {
    fn kind(&self) -> EngineKind {
        EngineKind::DeepL
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn translate(&self, unit: &TranslationUnit) -> Result<String, EngineError> {
        if !self.is_available() {
            return Err(EngineError::Unavailable("DeepL API key is not configured".to_string()));
        }

        let mut form = vec![
            ("text", unit.text.clone()),
            ("target_lang", unit.target_language.trim().to_uppercase()),
        ];
        if let Some(source) = Self::source_param(&unit.source_language) {
            form.push(("source_lang", source));
        }

        let response = self
            .client
            .post(self.api_url())
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&form)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("DeepL API error ({}): {}", status, error_text);
            if status == StatusCode::FORBIDDEN || status.as_u16() == QUOTA_EXCEEDED {
                return Err(EngineError::Permanent(format!("DeepL rejected the request ({}): {}", status, error_text)));
            }
            return Err(classify_status(status, error_text));
        }

        let deepl_response = response
            .json::<DeepLResponse>()
            .await
            .map_err(|e| EngineError::Transient(format!("Failed to parse DeepL API response: {}", e)))?;

        Self::extract_text_from_response(deepl_response)
    }
}
