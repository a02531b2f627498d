/*!
 * Engine adapter: one chunk in, one translation out.
 *
 * The adapter hides engine selection, retries and fallback from the
 * scheduler. It never fails: when every engine gives up, the original
 * text comes back marked as degraded.
 */

use log::{debug, error, warn};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, EngineKind};
use crate::errors::EngineError;
use crate::language_utils;
use crate::providers::deepl::DeepL;
use crate::providers::google::Google;
use crate::providers::{TranslationEngine, TranslationUnit};
use crate::translation::splitter::ChunkSplitter;

/// Outcome of translating one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkTranslation {
    /// Translated text, or the original text when degraded
    pub text: String,
    /// True when no engine produced a translation
    pub degraded: bool,
    /// Engine that produced the text, if any
    pub engine_used: Option<EngineKind>,
}

impl ChunkTranslation {
    fn passthrough(text: &str) -> Self {
        Self {
            text: text.to_string(),
            degraded: false,
            engine_used: None,
        }
    }

    fn degraded(text: &str) -> Self {
        Self {
            text: text.to_string(),
            degraded: true,
            engine_used: None,
        }
    }
}

/// Translates chunks through registered engines with retry and fallback
#[derive(Debug, Clone)]
pub struct EngineAdapter {
    engines: HashMap<EngineKind, Arc<dyn TranslationEngine>>,
    default_engine: EngineKind,
    retry_count: u32,
    retry_backoff_ms: u64,
    splitter: ChunkSplitter,
}

impl EngineAdapter {
    /// Create an adapter with no engines registered
    pub fn new(default_engine: EngineKind, retry_count: u32, retry_backoff_ms: u64, splitter: ChunkSplitter) -> Self {
        Self {
            engines: HashMap::new(),
            default_engine,
            retry_count,
            retry_backoff_ms,
            splitter,
        }
    }

    /// Register an engine under its own kind, replacing any previous one
    pub fn with_engine(mut self, engine: Arc<dyn TranslationEngine>) -> Self {
        self.engines.insert(engine.kind(), engine);
        self
    }

    /// Build the adapter with the HTTP engines described by the config
    pub fn from_config(config: &Config) -> Self {
        let engines = &config.engines;
        let google = Google::new(
            engines.get_endpoint(EngineKind::Google),
            engines.get_timeout(EngineKind::Google),
        );
        let deepl = DeepL::new(
            engines.get_api_key(EngineKind::DeepL),
            engines.get_endpoint(EngineKind::DeepL),
            engines.get_timeout(EngineKind::DeepL),
        );

        Self::new(
            engines.default_engine,
            config.common.retry_count,
            config.common.retry_backoff_ms,
            ChunkSplitter::new(&config.splitter),
        )
        .with_engine(Arc::new(google))
        .with_engine(Arc::new(deepl))
    }

    /// Engine used as the last resort
    pub fn default_engine(&self) -> EngineKind {
        self.default_engine
    }

    /// Whether the engine is registered and usable
    pub fn is_engine_available(&self, kind: EngineKind) -> bool {
        self.engines.get(&kind).is_some_and(|e| e.is_available())
    }

    /// Whether translating between these languages is a no-op
    pub fn is_passthrough(source_language: &str, target_language: &str) -> bool {
        !language_utils::is_auto(source_language)
            && language_utils::language_codes_match(source_language, target_language)
    }

    /// Translate one chunk
    ///
    /// Tries the requested engine, then the default engine, and finally
    /// returns the original text marked as degraded.
    pub async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        engine: EngineKind,
    ) -> ChunkTranslation {
        if text.trim().is_empty() || Self::is_passthrough(source_language, target_language) {
            return ChunkTranslation::passthrough(text);
        }

        if let Err(overflow) = self.splitter.check_hard_limit(text) {
            error!("{}; slicing before sending to the engine", overflow);
            let mut combined = String::with_capacity(text.len());
            let mut degraded = false;
            let mut engine_used = None;

            for slice in self.splitter.hard_slice(text) {
                let result = self
                    .translate_within_limit(&slice, source_language, target_language, engine)
                    .await;
                degraded |= result.degraded;
                engine_used = engine_used.or(result.engine_used);
                combined.push_str(&result.text);
            }

            return ChunkTranslation {
                text: combined,
                degraded,
                engine_used,
            };
        }

        self.translate_within_limit(text, source_language, target_language, engine)
            .await
    }

    async fn translate_within_limit(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        engine: EngineKind,
    ) -> ChunkTranslation {
        let mut candidates = vec![engine];
        if engine != self.default_engine {
            candidates.push(self.default_engine);
        }

        for kind in candidates {
            let unit = TranslationUnit::new(text, source_language, target_language, kind);
            match self.attempt(kind, &unit).await {
                Ok(translated) => {
                    return ChunkTranslation {
                        text: translated,
                        degraded: false,
                        engine_used: Some(kind),
                    };
                }
                Err(e) => warn!("{} could not translate chunk: {}", kind.display_name(), e),
            }
        }

        warn!(
            "All engines failed for a {}-char chunk, keeping original text",
            text.chars().count()
        );
        ChunkTranslation::degraded(text)
    }

    /// Call one engine with the retry policy
    async fn attempt(&self, kind: EngineKind, unit: &TranslationUnit) -> Result<String, EngineError> {
        let engine = self
            .engines
            .get(&kind)
            .ok_or_else(|| EngineError::Unavailable(format!("{} is not registered", kind.display_name())))?;

        if !engine.is_available() {
            return Err(EngineError::Unavailable(format!("{} is not configured", kind.display_name())));
        }

        let mut attempt = 0u32;
        loop {
            let error = match engine.translate(unit).await {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => EngineError::Transient("Engine returned an empty translation".to_string()),
                Err(e) => e,
            };

            if !error.is_transient() || attempt >= self.retry_count {
                return Err(error);
            }

            let backoff = self.backoff(attempt);
            debug!(
                "{} attempt {}/{} failed ({}), retrying in {:?}",
                kind.display_name(),
                attempt + 1,
                self.retry_count + 1,
                error,
                backoff
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    /// Exponential backoff with up to 25% random jitter
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.retry_backoff_ms.saturating_mul(1u64 << attempt.min(16));
        let jitter = if base >= 4 {
            rand::rng().random_range(0..=base / 4)
        } else {
            0
        };
        Duration::from_millis(base + jitter)
    }
}
