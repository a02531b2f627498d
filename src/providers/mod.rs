/*!
 * Engine implementations for different translation services.
 *
 * This module contains client implementations for the supported engines:
 * - Google: keyless web translation endpoint, the default engine
 * - DeepL: DeepL API integration, only available with an API key
 * - Mock: scripted engine used by tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::app_config::EngineKind;
use crate::errors::EngineError;

/// The atomic translatable input handed to an engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslationUnit {
    /// Text to translate, never longer than the splitter hard limit
    pub text: String,
    /// Source language code, or "auto"
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Engine the caller asked for
    pub engine: EngineKind,
}

impl TranslationUnit {
    /// Create a new unit
    pub fn new(
        text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        engine: EngineKind,
    ) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            engine,
        }
    }

    /// Stable cache fingerprint of this unit
    pub fn fingerprint(&self) -> String {
        crate::translation::cache::fingerprint(
            &self.text,
            &self.source_language,
            &self.target_language,
            self.engine,
        )
    }
}

/// Common trait for all translation engines
///
/// This trait defines the interface that all engine implementations must follow,
/// allowing them to be used interchangeably by the engine adapter.
#[async_trait]
pub trait TranslationEngine: Send + Sync + Debug {
    /// Which engine this is
    fn kind(&self) -> EngineKind;

    /// Whether the engine is usable (e.g. has credentials)
    fn is_available(&self) -> bool {
        true
    }

    /// Translate one unit
    ///
    /// # Arguments
    /// * `unit` - The text and language pair to translate
    ///
    /// # Returns
    /// * `Result<String, EngineError>` - The translated text or a classified error
    async fn translate(&self, unit: &TranslationUnit) -> Result<String, EngineError>;

    /// Test the connection to the engine
    async fn test_connection(&self) -> Result<(), EngineError> {
        let unit = TranslationUnit::new("Hello", "en", "es", self.kind());
        self.translate(&unit).await.map(|_| ())
    }
}

/// Map an HTTP status to an engine error class
pub(crate) fn classify_status(status: reqwest::StatusCode, body: String) -> EngineError {
    let message = format!("HTTP {}: {}", status, body);
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        EngineError::Transient(message)
    } else {
        EngineError::Permanent(message)
    }
}

/// Map a reqwest transport error to an engine error class
pub(crate) fn classify_request_error(error: reqwest::Error) -> EngineError {
    if error.is_builder() {
        EngineError::Permanent(format!("Invalid request: {}", error))
    } else {
        EngineError::Transient(format!("Request failed: {}", error))
    }
}

pub mod deepl;
pub mod google;
pub mod mock;
