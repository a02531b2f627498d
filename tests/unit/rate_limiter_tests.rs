/*!
 * Tests for per-submitter rate limiting
 */

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use chapterflow::scheduler::{MemoryRateLimitStore, RateLimitStore, RateLimiter};

#[test]
fn test_check_withSecondSubmissionTooSoon_shouldReportWait() {
    let limiter = RateLimiter::new(Duration::from_secs(60));
    let start = Instant::now();

    assert!(limiter.check_at("alice", start).is_ok());
    let err = limiter.check_at("alice", start + Duration::from_secs(20)).unwrap_err();

    assert_eq!(err.submitter_id, "alice");
    assert_eq!(err.retry_after, Duration::from_secs(40));
}

#[test]
fn test_allowAt_afterInterval_shouldAcceptAgain() {
    let limiter = RateLimiter::new(Duration::from_secs(60));
    let start = Instant::now();

    assert!(limiter.allow_at("bob", start));
    assert!(!limiter.allow_at("bob", start + Duration::from_secs(59)));
    assert!(limiter.allow_at("bob", start + Duration::from_secs(60)));
}

#[test]
fn test_reset_shouldForgetSubmitter() {
    let limiter = RateLimiter::new(Duration::from_secs(60));

    assert!(limiter.allow("carol"));
    assert!(limiter.state("carol").is_some());
    limiter.reset("carol");

    assert!(limiter.state("carol").is_none());
    assert!(limiter.allow("carol"));
}

#[test]
fn test_sharedStore_shouldLimitAcrossLimiters() {
    let store: Arc<dyn RateLimitStore> = Arc::new(MemoryRateLimitStore::new());
    let first = RateLimiter::with_store(Duration::from_secs(30), Arc::clone(&store));
    let second = RateLimiter::with_store(Duration::from_secs(30), store);

    assert!(first.allow("dave"));
    assert!(!second.allow("dave"));
}

#[test]
fn test_concurrentSubmissions_shouldAdmitExactlyOne() {
    let limiter = RateLimiter::new(Duration::from_secs(60));

    let admitted: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| limiter.allow("erin")))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|allowed| *allowed)
            .count()
    });

    assert_eq!(admitted, 1);
}
