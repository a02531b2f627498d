/*!
 * Tests for the engine adapter: retry, fallback and degradation
 */

use std::sync::Arc;

use chapterflow::app_config::{Config, EngineKind};
use chapterflow::providers::mock::{MockBehavior, MockEngine};
use chapterflow::providers::TranslationUnit;
use chapterflow::translation::splitter::ChunkSplitter;
use chapterflow::EngineAdapter;

use crate::common::small_splitter;

fn adapter(retry_count: u32, splitter: ChunkSplitter) -> EngineAdapter {
    EngineAdapter::new(EngineKind::Google, retry_count, 0, splitter)
}

#[tokio::test]
async fn test_translate_withPassthroughPair_shouldNotCallEngine() {
    let engine = MockEngine::working();
    let adapter = adapter(0, ChunkSplitter::default()).with_engine(Arc::new(engine.clone()));

    let result = adapter.translate("Hello.", "en", "eng", EngineKind::Google).await;

    assert_eq!(result.text, "Hello.");
    assert!(!result.degraded);
    assert_eq!(engine.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withAutoSource_shouldCallEngine() {
    let engine = MockEngine::working();
    let adapter = adapter(0, ChunkSplitter::default()).with_engine(Arc::new(engine.clone()));

    let result = adapter.translate("Hello.", "auto", "en", EngineKind::Google).await;

    assert_eq!(result.text, "[en] Hello.");
    assert_eq!(engine.request_count(), 1);
}

#[tokio::test]
async fn test_translate_withUnavailableRequestedEngine_shouldFallBackToDefault() {
    let google = MockEngine::working();
    let deepl = MockEngine::unavailable();
    let adapter = adapter(2, ChunkSplitter::default())
        .with_engine(Arc::new(google.clone()))
        .with_engine(Arc::new(deepl.clone()));

    let result = adapter.translate("Bonjour.", "fr", "en", EngineKind::DeepL).await;

    assert_eq!(result.engine_used, Some(EngineKind::Google));
    assert_eq!(result.text, "[en] Bonjour.");
    assert_eq!(deepl.request_count(), 0);
    assert!(!adapter.is_engine_available(EngineKind::DeepL));
}

#[tokio::test]
async fn test_translate_withRejectingEngine_shouldNotRetry() {
    let deepl = MockEngine::new(EngineKind::DeepL, MockBehavior::Rejecting);
    let google = MockEngine::working();
    let adapter = adapter(3, ChunkSplitter::default())
        .with_engine(Arc::new(deepl.clone()))
        .with_engine(Arc::new(google.clone()));

    let result = adapter.translate("Hallo.", "de", "en", EngineKind::DeepL).await;

    assert_eq!(deepl.request_count(), 1);
    assert_eq!(result.engine_used, Some(EngineKind::Google));
}

#[tokio::test]
async fn test_translate_withAlwaysFailingEngine_shouldUseEveryAttempt() {
    let engine = MockEngine::failing();
    let adapter = adapter(2, ChunkSplitter::default()).with_engine(Arc::new(engine.clone()));

    let result = adapter.translate("Hola.", "es", "en", EngineKind::Google).await;

    assert!(result.degraded);
    assert_eq!(result.text, "Hola.");
    assert_eq!(engine.request_count(), 3);
}

#[tokio::test]
async fn test_translate_withIntermittentEngine_shouldRecoverByRetrying() {
    // Every second call fails
    let engine = MockEngine::intermittent(2);
    let adapter = adapter(1, ChunkSplitter::default()).with_engine(Arc::new(engine.clone()));

    let first = adapter.translate("Hola.", "es", "en", EngineKind::Google).await;
    let second = adapter.translate("Adios.", "es", "en", EngineKind::Google).await;

    assert!(!first.degraded);
    assert!(!second.degraded);
    assert_eq!(second.text, "[en] Adios.");
    assert_eq!(engine.request_count(), 3);
}

#[tokio::test]
async fn test_translate_withEmptyResponses_shouldDegradeToOriginal() {
    let engine = MockEngine::new(EngineKind::Google, MockBehavior::Empty);
    let adapter = adapter(1, ChunkSplitter::default()).with_engine(Arc::new(engine.clone()));

    let result = adapter.translate("Ciao.", "it", "en", EngineKind::Google).await;

    assert!(result.degraded);
    assert_eq!(result.text, "Ciao.");
    assert_eq!(result.engine_used, None);
    assert_eq!(engine.request_count(), 2);
}

#[tokio::test]
async fn test_translate_withOversizedChunk_shouldSliceBeforeEngine() {
    let engine = MockEngine::working().with_custom_response(|unit: &TranslationUnit| unit.text.to_uppercase());
    let adapter = adapter(0, small_splitter()).with_engine(Arc::new(engine.clone()));
    let text = "abcdefghij".repeat(5);

    let result = adapter.translate(&text, "en", "fr", EngineKind::Google).await;

    assert_eq!(result.text, text.to_uppercase());
    assert!(engine.received().iter().all(|piece| piece.chars().count() <= 10));
    assert_eq!(engine.request_count(), 5);
}

#[test]
fn test_fromConfig_shouldRegisterBothEngines() {
    let adapter = EngineAdapter::from_config(&Config::default());

    assert_eq!(adapter.default_engine(), EngineKind::Google);
    assert!(adapter.is_engine_available(EngineKind::Google));
    // No DeepL key in the default config
    assert!(!adapter.is_engine_available(EngineKind::DeepL));
}
