/*!
 * Typed event dispatch around chapter translation.
 *
 * Extensions subscribe to one event kind each. Subscribers run
 * synchronously on the worker that emits the event; a panicking
 * subscriber is logged and skipped so it can never take a job down.
 */

use chrono::{DateTime, Utc};
use log::error;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::scheduler::models::JobStatus;

/// Kind of an emitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PreTranslation,
    PostTranslation,
    JobCompleted,
}

/// A chapter is about to be translated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreTranslationEvent {
    pub job_id: String,
    pub chapter_index: usize,
    pub chapter_name: String,
    /// Chapter length in chars
    pub char_count: usize,
    pub chunk_count: usize,
}

/// A chapter finished translating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostTranslationEvent {
    pub job_id: String,
    pub chapter_index: usize,
    pub chapter_name: String,
    pub total_chunks: usize,
    /// Chunks served from the cache
    pub cached_chunks: usize,
    /// Chunks that kept their original text
    pub degraded_chunks: usize,
}

/// A job reached a terminal state after running
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCompletedEvent {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Subscriber for `PreTranslation` events
pub trait PreTranslationSubscriber: Send + Sync {
    fn on_pre_translation(&self, event: &PreTranslationEvent);
}

/// Subscriber for `PostTranslation` events
pub trait PostTranslationSubscriber: Send + Sync {
    fn on_post_translation(&self, event: &PostTranslationEvent);
}

/// Subscriber for `JobCompleted` events
pub trait JobCompletedSubscriber: Send + Sync {
    fn on_job_completed(&self, event: &JobCompletedEvent);
}

impl<F> PreTranslationSubscriber for F
where
    F: Fn(&PreTranslationEvent) + Send + Sync,
{
    fn on_pre_translation(&self, event: &PreTranslationEvent) {
        self(event)
    }
}

impl<F> PostTranslationSubscriber for F
where
    F: Fn(&PostTranslationEvent) + Send + Sync,
{
    fn on_post_translation(&self, event: &PostTranslationEvent) {
        self(event)
    }
}

impl<F> JobCompletedSubscriber for F
where
    F: Fn(&JobCompletedEvent) + Send + Sync,
{
    fn on_job_completed(&self, event: &JobCompletedEvent) {
        self(event)
    }
}

/// Registry of subscribers, one list per event kind
#[derive(Default)]
pub struct EventBus {
    pre_translation: RwLock<Vec<Arc<dyn PreTranslationSubscriber>>>,
    post_translation: RwLock<Vec<Arc<dyn PostTranslationSubscriber>>>,
    job_completed: RwLock<Vec<Arc<dyn JobCompletedSubscriber>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("pre_translation", &self.pre_translation.read().len())
            .field("post_translation", &self.post_translation.read().len())
            .field("job_completed", &self.job_completed.read().len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_pre_translation(&self, subscriber: Arc<dyn PreTranslationSubscriber>) {
        self.pre_translation.write().push(subscriber);
    }

    pub fn subscribe_post_translation(&self, subscriber: Arc<dyn PostTranslationSubscriber>) {
        self.post_translation.write().push(subscriber);
    }

    pub fn subscribe_job_completed(&self, subscriber: Arc<dyn JobCompletedSubscriber>) {
        self.job_completed.write().push(subscriber);
    }

    /// Number of subscribers registered for a kind
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::PreTranslation => self.pre_translation.read().len(),
            EventKind::PostTranslation => self.post_translation.read().len(),
            EventKind::JobCompleted => self.job_completed.read().len(),
        }
    }

    pub fn emit_pre_translation(&self, event: &PreTranslationEvent) {
        // Snapshot so subscribers may subscribe others without deadlocking
        let subscribers = self.pre_translation.read().clone();
        for subscriber in subscribers {
            guarded(EventKind::PreTranslation, || subscriber.on_pre_translation(event));
        }
    }

    pub fn emit_post_translation(&self, event: &PostTranslationEvent) {
        let subscribers = self.post_translation.read().clone();
        for subscriber in subscribers {
            guarded(EventKind::PostTranslation, || subscriber.on_post_translation(event));
        }
    }

    pub fn emit_job_completed(&self, event: &JobCompletedEvent) {
        let subscribers = self.job_completed.read().clone();
        for subscriber in subscribers {
            guarded(EventKind::JobCompleted, || subscriber.on_job_completed(event));
        }
    }
}

fn guarded(kind: EventKind, call: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(call)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!("{:?} subscriber panicked: {}", kind, message);
    }
}
