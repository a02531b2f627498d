/*!
 * End-to-end tests for the job scheduler with mock engines
 */

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use chapterflow::app_config::EngineKind;
use chapterflow::errors::SchedulerError;
use chapterflow::providers::mock::{MockBehavior, MockEngine};
use chapterflow::providers::TranslationUnit;
use chapterflow::scheduler::{JobOptions, JobStatus, JobStatusReport, MemoryRateLimitStore, RateLimiter};
use chapterflow::translation::cache::{CacheEntry, CacheStore, MemoryCacheBackend};
use chapterflow::translation::events::{JobCompletedEvent, PostTranslationEvent};
use chapterflow::JobScheduler;

use crate::common::{request, sample_chapters, scheduler_builder, small_splitter, test_scheduler};

const WAIT_LIMIT: Duration = Duration::from_secs(10);

async fn wait(scheduler: &JobScheduler, job_id: &str) -> JobStatusReport {
    tokio::time::timeout(WAIT_LIMIT, scheduler.wait_for_completion(job_id))
        .await
        .expect("job did not finish in time")
        .unwrap()
}

async fn wait_for_status(scheduler: &JobScheduler, job_id: &str, status: JobStatus) {
    tokio::time::timeout(WAIT_LIMIT, async {
        while scheduler.get_status(job_id).map(|r| r.status) != Some(status) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("job never reached the expected status");
}

fn single(name: &str, text: &str) -> Vec<(String, String)> {
    vec![(name.to_string(), text.to_string())]
}

#[tokio::test]
async fn test_submit_withWorkingEngine_shouldCompleteWithTranslation() {
    let engine = MockEngine::working();
    let scheduler = test_scheduler(engine.clone(), 2);
    scheduler.start();

    let job_id = scheduler.submit(request("alice", sample_chapters(2))).await.unwrap();
    let report = wait(&scheduler, &job_id).await;

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.progress_percent, 100);
    let result = scheduler.get_result(&job_id).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].0, "Chapter 1");
    assert_eq!(result[0].1, "[fr] This is chapter 1. It has two sentences.");
    assert_eq!(engine.request_count(), 2);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_dispatch_withSingleSlot_shouldRunHigherPriorityFirst() {
    let engine = MockEngine::working();
    let scheduler = test_scheduler(engine.clone(), 1);

    let low = scheduler
        .enqueue(request("alice", single("low", "Low priority.")).with_priority(1))
        .await
        .unwrap();
    let normal = scheduler
        .enqueue(request("bob", single("normal", "Normal priority.")).with_priority(2))
        .await
        .unwrap();
    let urgent = scheduler
        .enqueue(request("carol", single("urgent", "Urgent priority.")).with_priority(4))
        .await
        .unwrap();

    scheduler.start();
    for job_id in [&low, &normal, &urgent] {
        assert_eq!(wait(&scheduler, job_id).await.status, JobStatus::Completed);
    }

    assert_eq!(
        engine.received(),
        vec!["Urgent priority.", "Normal priority.", "Low priority."]
    );
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_dispatch_withEqualPriority_shouldKeepSubmissionOrder() {
    let engine = MockEngine::working();
    let scheduler = test_scheduler(engine.clone(), 1);

    let mut ids = Vec::new();
    for text in ["First.", "Second.", "Third."] {
        ids.push(scheduler.enqueue(request("alice", single(text, text))).await.unwrap());
    }

    scheduler.start();
    for job_id in &ids {
        wait(&scheduler, job_id).await;
    }

    assert_eq!(engine.received(), vec!["First.", "Second.", "Third."]);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_job_withFailingEngine_shouldCompleteDegradedWithOriginalText() {
    let engine = MockEngine::failing();
    let scheduler = test_scheduler(engine, 1);
    scheduler.start();

    let chapters = sample_chapters(2);
    let job_id = scheduler.submit(request("alice", chapters.clone())).await.unwrap();
    let report = wait(&scheduler, &job_id).await;

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(scheduler.get_result(&job_id).unwrap(), chapters);
    assert_eq!(scheduler.get_job(&job_id).unwrap().degraded_chunks(), 2);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_job_withDegradedChunks_shouldNotCacheThem() {
    let engine = MockEngine::failing();
    let scheduler = test_scheduler(engine.clone(), 1);
    scheduler.start();

    for _ in 0..2 {
        let job_id = scheduler.submit(request("alice", sample_chapters(1))).await.unwrap();
        wait(&scheduler, &job_id).await;
    }

    assert_eq!(engine.request_count(), 2);
    assert_eq!(scheduler.cache().stats().hits, 0);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_worker_withPanickingEngine_shouldFailJobAndKeepServing() {
    let engine = MockEngine::new(EngineKind::Google, MockBehavior::Panicking);
    let scheduler = test_scheduler(engine, 1);
    scheduler.start();

    let broken = scheduler.submit(request("alice", sample_chapters(1))).await.unwrap();
    let report = wait(&scheduler, &broken).await;

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report.error_message.unwrap().contains("Simulated engine panic"));
    assert!(matches!(
        scheduler.get_result(&broken),
        Err(SchedulerError::JobNotCompleted(JobStatus::Failed))
    ));

    // Same-language jobs never reach the engine
    let passthrough = scheduler
        .submit(chapterflow::SubmitRequest::new("bob", sample_chapters(1), "en", "en"))
        .await
        .unwrap();
    assert_eq!(wait(&scheduler, &passthrough).await.status, JobStatus::Completed);
    assert_eq!(scheduler.queue_stats(None).busy_slots, 0);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_cancel_withQueuedJob_shouldCheckOwnership() {
    let engine = MockEngine::working();
    let scheduler = test_scheduler(engine.clone(), 1);

    let job_id = scheduler.enqueue(request("alice", sample_chapters(1))).await.unwrap();

    assert!(matches!(
        scheduler.cancel(&job_id, "mallory").await,
        Err(SchedulerError::NotOwner(_))
    ));
    scheduler.cancel(&job_id, "alice").await.unwrap();
    assert!(matches!(
        scheduler.cancel(&job_id, "alice").await,
        Err(SchedulerError::NotCancellable(JobStatus::Cancelled))
    ));
    assert!(matches!(
        scheduler.cancel("missing", "alice").await,
        Err(SchedulerError::JobNotFound(_))
    ));

    scheduler.start();
    let other = scheduler.enqueue(request("bob", sample_chapters(1))).await.unwrap();
    wait(&scheduler, &other).await;

    assert_eq!(wait(&scheduler, &job_id).await.status, JobStatus::Cancelled);
    assert_eq!(engine.request_count(), 1);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_cancel_withProcessingJob_shouldRefuse() {
    let scheduler = test_scheduler(MockEngine::slow(200), 1);
    scheduler.start();

    let job_id = scheduler.submit(request("alice", sample_chapters(1))).await.unwrap();
    wait_for_status(&scheduler, &job_id, JobStatus::Processing).await;

    assert!(matches!(
        scheduler.cancel(&job_id, "alice").await,
        Err(SchedulerError::NotCancellable(JobStatus::Processing))
    ));
    assert!(matches!(
        scheduler.remove_job(&job_id).await,
        Err(SchedulerError::NotCancellable(JobStatus::Processing))
    ));

    assert_eq!(wait(&scheduler, &job_id).await.status, JobStatus::Completed);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_submit_withinRateLimit_shouldRejectSameSubmitterOnly() {
    let scheduler = scheduler_builder(MockEngine::working(), 1)
        .rate_limiter(RateLimiter::new(Duration::from_secs(60)))
        .build();

    scheduler.submit(request("alice", sample_chapters(1))).await.unwrap();

    match scheduler.submit(request("alice", sample_chapters(1))).await {
        Err(SchedulerError::RateLimited(e)) => {
            assert_eq!(e.submitter_id, "alice");
            assert!(e.retry_after > Duration::from_secs(50));
        }
        other => panic!("expected a rate limit rejection, got {:?}", other),
    }
    assert!(scheduler.submit(request("bob", sample_chapters(1))).await.is_ok());
    assert_eq!(scheduler.queue_stats(None).queued, 2);
}

#[tokio::test(start_paused = true)]
async fn test_submit_afterRateLimitInterval_shouldBeAllowedAgain() {
    let scheduler = scheduler_builder(MockEngine::working(), 1)
        .rate_limiter(RateLimiter::new(Duration::from_secs(60)))
        .build();

    scheduler.submit(request("alice", sample_chapters(1))).await.unwrap();

    tokio::time::advance(Duration::from_secs(59)).await;
    match scheduler.submit(request("alice", sample_chapters(1))).await {
        Err(SchedulerError::RateLimited(e)) => assert_eq!(e.retry_after, Duration::from_secs(1)),
        other => panic!("expected a rate limit rejection, got {:?}", other),
    }

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(scheduler.submit(request("alice", sample_chapters(1))).await.is_ok());
    assert_eq!(scheduler.queue_stats(Some("alice")).queued, 2);
}

#[tokio::test(start_paused = true)]
async fn test_dispatchLoop_shouldSweepExpiredEntriesAndIdleSubmitters() {
    let cache_backend = Arc::new(MemoryCacheBackend::new());
    for key in ["stale-1", "stale-2"] {
        let mut entry = CacheEntry::new(key, "old", Duration::from_secs(60));
        entry.created_at = chrono::Utc::now() - chrono::Duration::minutes(5);
        cache_backend.insert_entry(entry);
    }
    let limiter_store = Arc::new(MemoryRateLimitStore::new());

    // Housekeeping runs every 60s with the shared test config
    let scheduler = scheduler_builder(MockEngine::working(), 1)
        .cache(CacheStore::new(cache_backend.clone(), true, Duration::from_secs(86_400)))
        .rate_limiter(RateLimiter::with_store(Duration::from_secs(60), limiter_store.clone()))
        .build();
    scheduler.start();

    let job_id = scheduler.submit(request("alice", sample_chapters(1))).await.unwrap();
    assert_eq!(wait(&scheduler, &job_id).await.status, JobStatus::Completed);
    assert_eq!(cache_backend.len(), 3);
    assert_eq!(limiter_store.len(), 1);

    tokio::time::timeout(Duration::from_secs(120), async {
        while cache_backend.len() > 1 || !limiter_store.is_empty() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await
    .expect("housekeeping did not run");

    // Only the fresh translation survives the sweep
    assert_eq!(cache_backend.len(), 1);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_submit_withInvalidRequest_shouldNotConsumeRateLimit() {
    let scheduler = scheduler_builder(MockEngine::working(), 1)
        .rate_limiter(RateLimiter::new(Duration::from_secs(60)))
        .build();

    assert!(matches!(
        scheduler.submit(request("alice", sample_chapters(1)).with_priority(7)).await,
        Err(SchedulerError::InvalidPriority(7))
    ));
    assert!(matches!(
        scheduler.submit(request("alice", Vec::new())).await,
        Err(SchedulerError::EmptySubmission)
    ));
    assert!(scheduler.submit(request("alice", sample_chapters(1))).await.is_ok());
}

#[tokio::test]
async fn test_progress_shouldBeReportedAfterEachChapter() {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    let scheduler = scheduler_builder(MockEngine::working(), 1)
        .progress_callback(Arc::new(move |_job_id: &str, percent: u8| sink.lock().push(percent)))
        .build();
    scheduler.start();

    let job_id = scheduler.submit(request("alice", sample_chapters(4))).await.unwrap();
    wait(&scheduler, &job_id).await;

    assert_eq!(*updates.lock(), vec![25, 50, 75, 100]);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_progress_withThreeChapters_shouldRoundDown() {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    let scheduler = scheduler_builder(MockEngine::working(), 1)
        .progress_callback(Arc::new(move |_job_id: &str, percent: u8| sink.lock().push(percent)))
        .build();
    scheduler.start();

    let job_id = scheduler.submit(request("alice", sample_chapters(3))).await.unwrap();
    wait(&scheduler, &job_id).await;

    assert_eq!(*updates.lock(), vec![33, 66, 100]);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_resubmission_shouldBeServedFromCache() {
    let engine = MockEngine::working();
    let scheduler = test_scheduler(engine.clone(), 1);
    let cached_per_chapter = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&cached_per_chapter);
    scheduler
        .events()
        .subscribe_post_translation(Arc::new(move |event: &PostTranslationEvent| {
            sink.lock().push(event.cached_chunks)
        }));
    scheduler.start();

    let first = scheduler.submit(request("alice", sample_chapters(2))).await.unwrap();
    wait(&scheduler, &first).await;
    let second = scheduler.submit(request("bob", sample_chapters(2))).await.unwrap();
    wait(&scheduler, &second).await;

    assert_eq!(engine.request_count(), 2);
    assert_eq!(*cached_per_chapter.lock(), vec![0, 0, 1, 1]);
    assert_eq!(
        scheduler.get_result(&first).unwrap(),
        scheduler.get_result(&second).unwrap()
    );
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_multiChunkChapter_shouldReassembleInOrder() {
    let engine = MockEngine::slow(5).with_custom_response(|unit: &TranslationUnit| unit.text.to_uppercase());
    let scheduler = scheduler_builder(engine.clone(), 1).splitter(small_splitter()).build();
    scheduler.start();

    let text = "One small step. Two small steps. Three small steps. Four. Five and the end.";
    let job_id = scheduler.submit(request("alice", single("long", text))).await.unwrap();
    wait(&scheduler, &job_id).await;

    let job = scheduler.get_job(&job_id).unwrap();
    assert!(job.chapters[0].chunks.len() > 2);
    assert_eq!(scheduler.get_result(&job_id).unwrap()[0].1, text.to_uppercase());
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_whitespaceChapter_shouldPassThroughUnchanged() {
    let engine = MockEngine::working();
    let scheduler = test_scheduler(engine.clone(), 1);
    scheduler.start();

    let chapters = vec![
        ("blank".to_string(), "   \n\n  ".to_string()),
        ("text".to_string(), "Words.".to_string()),
    ];
    let job_id = scheduler.submit(request("alice", chapters)).await.unwrap();
    wait(&scheduler, &job_id).await;

    let result = scheduler.get_result(&job_id).unwrap();
    assert_eq!(result[0].1, "   \n\n  ");
    assert_eq!(result[1].1, "[fr] Words.");
    assert_eq!(engine.request_count(), 1);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_replaceQuotesOption_shouldRewriteTranslatedDialogue() {
    let scheduler = test_scheduler(MockEngine::working(), 1);
    scheduler.start();

    let job_id = scheduler
        .submit(
            request("alice", single("dialogue", "\"Hello,\" she said."))
                .with_options(JobOptions { replace_quotes: true }),
        )
        .await
        .unwrap();
    wait(&scheduler, &job_id).await;

    assert_eq!(
        scheduler.get_result(&job_id).unwrap()[0].1,
        "[fr] ―Hello,― she said."
    );
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_jobCompletedEvent_shouldFireOncePerJob() {
    let scheduler = test_scheduler(MockEngine::working(), 2);
    let completed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&completed);
    scheduler
        .events()
        .subscribe_job_completed(Arc::new(move |event: &JobCompletedEvent| {
            sink.lock().push((event.job_id.clone(), event.status))
        }));
    scheduler.start();

    let a = scheduler.submit(request("alice", sample_chapters(1))).await.unwrap();
    let b = scheduler.submit(request("bob", sample_chapters(2))).await.unwrap();
    wait(&scheduler, &a).await;
    wait(&scheduler, &b).await;

    let completed = completed.lock().clone();
    assert_eq!(completed.len(), 2);
    assert!(completed.iter().all(|(_, status)| *status == JobStatus::Completed));
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_queueStats_andListJobs_shouldFilterBySubmitter() {
    let scheduler = test_scheduler(MockEngine::working(), 1);

    scheduler.enqueue(request("alice", sample_chapters(1))).await.unwrap();
    scheduler.enqueue(request("alice", sample_chapters(1))).await.unwrap();
    let bob = scheduler.enqueue(request("bob", sample_chapters(1))).await.unwrap();

    assert_eq!(scheduler.queue_stats(None).total(), 3);
    assert_eq!(scheduler.queue_stats(Some("alice")).queued, 2);
    assert_eq!(scheduler.list_jobs(Some("bob"))[0].id, bob);
    assert!(scheduler.list_jobs(Some("nobody")).is_empty());

    let status = scheduler.get_status(&bob).unwrap();
    assert_eq!(status.status, JobStatus::Queued);
    assert_eq!(status.progress_percent, 0);
    assert!(status.estimated_seconds > 0.0);
}

#[tokio::test]
async fn test_purgeFinished_shouldDropOnlyTerminalJobs() {
    let scheduler = test_scheduler(MockEngine::working(), 1);
    scheduler.start();

    let done = scheduler.submit(request("alice", sample_chapters(1))).await.unwrap();
    wait(&scheduler, &done).await;
    scheduler.shutdown().await;
    let pending = scheduler.enqueue(request("bob", sample_chapters(1))).await;
    assert!(matches!(pending, Err(SchedulerError::ShutDown)));

    assert_eq!(scheduler.purge_finished(Duration::from_secs(3600)).await, 0);
    assert_eq!(scheduler.purge_finished(Duration::ZERO).await, 1);
    assert!(scheduler.get_status(&done).is_none());
}

#[tokio::test]
async fn test_removeJob_withQueuedJob_shouldForgetIt() {
    let scheduler = test_scheduler(MockEngine::working(), 1);

    let job_id = scheduler.enqueue(request("alice", sample_chapters(1))).await.unwrap();
    let removed = scheduler.remove_job(&job_id).await.unwrap();

    assert_eq!(removed.id, job_id);
    assert!(scheduler.get_job(&job_id).is_none());
    assert_eq!(scheduler.queue_stats(None).total(), 0);
    assert!(matches!(
        scheduler.wait_for_completion(&job_id).await,
        Err(SchedulerError::JobNotFound(_))
    ));
}

#[tokio::test]
async fn test_workerSlots_shouldBoundConcurrency() {
    let engine = MockEngine::slow(50);
    let scheduler = test_scheduler(engine, 2);
    scheduler.start();

    let mut ids = Vec::new();
    for n in 0..4 {
        ids.push(
            scheduler
                .submit(request(&format!("user-{}", n), single("one", &format!("Text number {}.", n))))
                .await
                .unwrap(),
        );
    }

    let mut peak = 0;
    while scheduler.queue_stats(None).completed < ids.len() {
        let stats = scheduler.queue_stats(None);
        assert!(stats.processing <= 2);
        assert!(stats.busy_slots <= stats.worker_slots);
        peak = peak.max(stats.processing);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(peak >= 1);
    scheduler.shutdown().await;
}
