/*!
 * Mock engine implementations for testing.
 *
 * This module provides mock engines that simulate different behaviors:
 * - `MockEngine::working()` - Always succeeds with translated text
 * - `MockEngine::intermittent(n)` - Fails every n-th request
 * - `MockEngine::failing()` - Always fails with a transient error
 * - `MockEngine::unavailable()` - Reports itself as not configured
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::app_config::EngineKind;
use crate::errors::EngineError;
use crate::providers::{TranslationEngine, TranslationUnit};

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with a transient error
    Failing,
    /// Always fails with a permanent error
    Rejecting,
    /// Not configured; every call is refused
    Unavailable,
    /// Returns empty text
    Empty,
    /// Simulates slow response
    Slow { delay_ms: u64 },
    /// Panics inside the call
    Panicking,
}

/// Mock engine for testing translation behavior
#[derive(Debug)]
pub struct MockEngine {
    /// Engine identity reported to the adapter
    kind: EngineKind,
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Every text received, in call order
    received: Arc<Mutex<Vec<String>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&TranslationUnit) -> String>,
}

impl MockEngine {
    /// Create a new mock engine with the specified behavior
    pub fn new(kind: EngineKind, behavior: MockBehavior) -> Self {
        Self {
            kind,
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    /// Create a working mock engine that always succeeds
    pub fn working() -> Self {
        Self::new(EngineKind::Google, MockBehavior::Working)
    }

    /// Create an intermittently failing mock engine
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(EngineKind::Google, MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock engine that always errors
    pub fn failing() -> Self {
        Self::new(EngineKind::Google, MockBehavior::Failing)
    }

    /// Create a mock engine that is not configured
    pub fn unavailable() -> Self {
        Self::new(EngineKind::DeepL, MockBehavior::Unavailable)
    }

    /// Create a slow mock engine
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(EngineKind::Google, MockBehavior::Slow { delay_ms })
    }

    /// Report a different engine identity
    pub fn as_kind(mut self, kind: EngineKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&TranslationUnit) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Default translation produced by working mocks
    pub fn render(unit: &TranslationUnit) -> String {
        format!("[{}] {}", unit.target_language, unit.text)
    }

    /// Number of translate calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts received so far, in call order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    fn respond(&self, unit: &TranslationUnit) -> String {
        match self.custom_response {
            Some(generator) => generator(unit),
            None => Self::render(unit),
        }
    }
}

impl Clone for MockEngine {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            received: Arc::clone(&self.received),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        self.behavior != MockBehavior::Unavailable
    }

    async fn translate(&self, unit: &TranslationUnit) -> Result<String, EngineError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.received.lock().push(unit.text.clone());

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(unit)),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(EngineError::Transient(format!(
                        "Simulated intermittent failure (request #{})",
                        count + 1
                    )))
                } else {
                    Ok(self.respond(unit))
                }
            }

            MockBehavior::Failing => Err(EngineError::Transient("Simulated engine failure".to_string())),

            MockBehavior::Rejecting => Err(EngineError::Permanent("Simulated invalid credentials".to_string())),

            MockBehavior::Unavailable => Err(EngineError::Unavailable("Simulated missing API key".to_string())),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.respond(unit))
            }

            MockBehavior::Panicking => panic!("Simulated engine panic"),
        }
    }
}
