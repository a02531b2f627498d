use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::app_config::EngineKind;
use crate::errors::EngineError;
use crate::providers::{classify_request_error, classify_status, TranslationEngine, TranslationUnit};

/// Public endpoint used when none is configured
const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com";

/// Google client for the keyless web translation endpoint
#[derive(Debug, Clone)]
pub struct Google {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the service
    endpoint: String,
}

impl Google {
    /// Create a new Google client
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint: if endpoint.is_empty() {
                DEFAULT_ENDPOINT.to_string()
            } else {
                endpoint.trim_end_matches('/').to_string()
            },
        }
    }

    /// Extract the translated text from the nested array response
    ///
    /// The service answers with `[[["translated", "original", ...], ...], ...]`,
    /// one inner entry per sentence.
    pub fn extract_text_from_response(response: &Value) -> Result<String, EngineError> {
        let segments = response
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| EngineError::Transient("Unexpected Google response shape".to_string()))?;

        Ok(segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect())
    }
}

#[async_trait]
impl TranslationEngine for Google {
    fn kind(&self) -> EngineKind {
        EngineKind::Google
    }

    async fn translate(&self, unit: &TranslationUnit) -> Result<String, EngineError> {
        let api_url = format!("{}/translate_a/single", self.endpoint);

        let response = self
            .client
            .post(&api_url)
            .query(&[
                ("client", "gtx"),
                ("sl", unit.source_language.as_str()),
                ("tl", unit.target_language.as_str()),
                ("dt", "t"),
            ])
            .form(&[("q", unit.text.as_str())])
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Google translate error ({}): {}", status, error_text);
            return Err(classify_status(status, error_text));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| EngineError::Transient(format!("Failed to parse Google response: {}", e)))?;

        Self::extract_text_from_response(&body)
    }
}
