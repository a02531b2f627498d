//! Per-submitter submission rate limiting.
//!
//! A submitter may start new work at most once per interval. Only allowed
//! submissions move the window; rejections leave it untouched.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::RateLimitExceeded;

/// Last allowed submission of one submitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitState {
    pub submitter_id: String,
    pub last_submission_at: Instant,
}

/// Where rate-limit state lives
///
/// `try_acquire` must check and record atomically so two concurrent
/// submissions from one submitter cannot both pass.
pub trait RateLimitStore: Send + Sync + Debug {
    /// Record `now` if at least `interval` elapsed since the last record.
    /// Returns the remaining wait on rejection.
    fn try_acquire(&self, submitter_id: &str, now: Instant, interval: Duration) -> Result<(), Duration>;

    /// Current state for a submitter
    fn state(&self, submitter_id: &str) -> Option<RateLimitState>;

    /// Forget a submitter
    fn clear(&self, submitter_id: &str);

    /// Forget submitters whose window closed by `now`; returns how many
    fn purge_stale(&self, now: Instant, interval: Duration) -> usize;
}

/// In-process rate-limit state
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked submitters
    pub fn len(&self) -> usize {
        self.last_seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.lock().is_empty()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    fn try_acquire(&self, submitter_id: &str, now: Instant, interval: Duration) -> Result<(), Duration> {
        let mut last_seen = self.last_seen.lock();
        if let Some(last) = last_seen.get(submitter_id) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < interval {
                return Err(interval - elapsed);
            }
        }
        last_seen.insert(submitter_id.to_string(), now);
        Ok(())
    }

    fn state(&self, submitter_id: &str) -> Option<RateLimitState> {
        self.last_seen.lock().get(submitter_id).map(|at| RateLimitState {
            submitter_id: submitter_id.to_string(),
            last_submission_at: *at,
        })
    }

    fn clear(&self, submitter_id: &str) {
        self.last_seen.lock().remove(submitter_id);
    }

    fn purge_stale(&self, now: Instant, interval: Duration) -> usize {
        let mut last_seen = self.last_seen.lock();
        let before = last_seen.len();
        last_seen.retain(|_, last| now.saturating_duration_since(*last) < interval);
        before - last_seen.len()
    }
}

/// Gate on how often one submitter may submit
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    interval: Duration,
}

impl RateLimiter {
    /// In-memory limiter; a zero interval allows everything
    pub fn new(interval: Duration) -> Self {
        Self::with_store(interval, Arc::new(MemoryRateLimitStore::new()))
    }

    pub fn with_store(interval: Duration, store: Arc<dyn RateLimitStore>) -> Self {
        Self { store, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the submitter may submit now; records the submission if so
    pub fn allow(&self, submitter_id: &str) -> bool {
        self.allow_at(submitter_id, Instant::now())
    }

    /// `allow` with an explicit clock reading
    pub fn allow_at(&self, submitter_id: &str, now: Instant) -> bool {
        self.check_at(submitter_id, now).is_ok()
    }

    /// Like `allow`, but reports how long to wait on rejection
    pub fn check(&self, submitter_id: &str) -> Result<(), RateLimitExceeded> {
        self.check_at(submitter_id, Instant::now())
    }

    /// `check` with an explicit clock reading
    pub fn check_at(&self, submitter_id: &str, now: Instant) -> Result<(), RateLimitExceeded> {
        if self.interval.is_zero() {
            return Ok(());
        }

        self.store
            .try_acquire(submitter_id, now, self.interval)
            .map_err(|retry_after| RateLimitExceeded {
                submitter_id: submitter_id.to_string(),
                retry_after,
            })
    }

    /// Forget the submitter's last submission
    pub fn reset(&self, submitter_id: &str) {
        self.store.clear(submitter_id);
    }

    pub fn state(&self, submitter_id: &str) -> Option<RateLimitState> {
        self.store.state(submitter_id)
    }

    /// Drop submitters that may submit again anyway
    pub fn purge_stale(&self) -> usize {
        self.purge_stale_at(Instant::now())
    }

    /// `purge_stale` with an explicit clock reading
    pub fn purge_stale_at(&self, now: Instant) -> usize {
        self.store.purge_stale(now, self.interval)
    }
}
