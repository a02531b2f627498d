/*!
 * Job scheduler: priority queue, worker slots and per-job orchestration.
 *
 * One background task pulls the highest-ranked queued job whenever a worker
 * slot is free and hands it to a spawned worker. The worker splits every
 * chapter, translates the chunks (cache first, engine on miss) with a
 * bounded fan-out, reassembles them in order and reports progress after
 * each chapter.
 *
 * Each job sits behind its own lock. Once dispatched, the worker is the
 * only writer; every query clones a snapshot.
 */

use anyhow::Result;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

use super::models::{
    Chunk, ChunkStatus, Job, JobOptions, JobStatus, JobStatusReport, Priority, QueueStats, SubmitRequest,
};
use super::queue::JobQueue;
use super::rate_limiter::RateLimiter;
use super::store::{JobQueueBackend, MemoryJobBackend};
use crate::app_config::{EngineKind, SchedulerConfig};
use crate::errors::{JobExecutionError, SchedulerError};
use crate::translation::cache::{self, CacheStore};
use crate::translation::engine::EngineAdapter;
use crate::translation::events::{EventBus, JobCompletedEvent, PostTranslationEvent, PreTranslationEvent};
use crate::translation::formatting;
use crate::translation::splitter::ChunkSplitter;

/// Progress push: `(job_id, percent)` after each chapter
pub type ProgressCallback = Arc<dyn Fn(&str, u8) + Send + Sync>;

/// Bytes per estimation unit
const ESTIMATE_UNIT_BYTES: f64 = 10.0 * 1024.0;

/// Seconds per estimation unit with an idle pool
const ESTIMATE_SECONDS_PER_UNIT: f64 = 1.5;

/// Message recorded on jobs that were running when the process stopped
const INTERRUPTED_MESSAGE: &str = "interrupted before completion";

/// Language pair and engine shared by every chunk of a job
#[derive(Debug, Clone)]
struct ChunkContext {
    source_language: String,
    target_language: String,
    engine: EngineKind,
}

struct SchedulerInner {
    jobs: RwLock<HashMap<String, Arc<RwLock<Job>>>>,
    queue: Mutex<JobQueue>,
    slots: Arc<Semaphore>,
    worker_slots: usize,
    busy_slots: AtomicUsize,
    chunk_fan_out: usize,
    poll_interval: Duration,
    housekeeping_interval: Duration,
    splitter: ChunkSplitter,
    cache: CacheStore,
    engine: EngineAdapter,
    rate_limiter: RateLimiter,
    backend: Arc<dyn JobQueueBackend>,
    events: Arc<EventBus>,
    progress: Option<ProgressCallback>,
    /// Wakes the dispatch loop early (enqueue, slot release)
    wake: Notify,
    /// Signalled whenever a job reaches a terminal state
    finished: Notify,
    shutdown_tx: watch::Sender<bool>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

/// Builder for `JobScheduler`
pub struct JobSchedulerBuilder {
    engine: EngineAdapter,
    config: SchedulerConfig,
    splitter: ChunkSplitter,
    cache: Option<CacheStore>,
    rate_limiter: Option<RateLimiter>,
    backend: Option<Arc<dyn JobQueueBackend>>,
    events: Option<Arc<EventBus>>,
    progress: Option<ProgressCallback>,
}

impl JobSchedulerBuilder {
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn splitter(mut self, splitter: ChunkSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the limiter built from `rate_limit_secs`
    pub fn rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn JobQueueBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn build(self) -> JobScheduler {
        let worker_slots = self.config.worker_slots.max(1);
        let (shutdown_tx, _) = watch::channel(false);

        JobScheduler {
            inner: Arc::new(SchedulerInner {
                jobs: RwLock::new(HashMap::new()),
                queue: Mutex::new(JobQueue::new()),
                slots: Arc::new(Semaphore::new(worker_slots)),
                worker_slots,
                busy_slots: AtomicUsize::new(0),
                chunk_fan_out: self.config.chunk_fan_out.max(1),
                poll_interval: self.config.poll_interval(),
                housekeeping_interval: self.config.housekeeping_interval(),
                splitter: self.splitter,
                cache: self.cache.unwrap_or_else(CacheStore::disabled),
                engine: self.engine,
                rate_limiter: self
                    .rate_limiter
                    .unwrap_or_else(|| RateLimiter::new(self.config.rate_limit_interval())),
                backend: self.backend.unwrap_or_else(|| Arc::new(MemoryJobBackend::new())),
                events: self.events.unwrap_or_default(),
                progress: self.progress,
                wake: Notify::new(),
                finished: Notify::new(),
                shutdown_tx,
                loop_handle: Mutex::new(None),
            }),
        }
    }
}

/// Handle to the scheduler; cheap to clone
#[derive(Clone)]
pub struct JobScheduler {
    inner: Arc<SchedulerInner>,
}

impl std::fmt::Debug for JobScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobScheduler")
            .field("worker_slots", &self.inner.worker_slots)
            .field("jobs", &self.inner.jobs.read().len())
            .finish()
    }
}

impl JobScheduler {
    /// Start building a scheduler around an engine adapter
    pub fn builder(engine: EngineAdapter) -> JobSchedulerBuilder {
        JobSchedulerBuilder {
            engine,
            config: SchedulerConfig::default(),
            splitter: ChunkSplitter::default(),
            cache: None,
            rate_limiter: None,
            backend: None,
            events: None,
            progress: None,
        }
    }

    /// Spawn the dispatch loop; calling it again is a no-op
    pub fn start(&self) {
        let mut handle = self.inner.loop_handle.lock();
        if handle.is_some() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let shutdown_rx = self.inner.shutdown_tx.subscribe();
        *handle = Some(tokio::spawn(Self::run_loop(inner, shutdown_rx)));
        info!("Job scheduler started with {} worker slot(s)", self.inner.worker_slots);
    }

    /// Stop dispatching and wait for the loop to exit
    ///
    /// Workers already running finish their job.
    pub async fn shutdown(&self) {
        self.inner.shutdown_tx.send_replace(true);
        self.inner.wake.notify_one();

        let handle = self.inner.loop_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Scheduler loop ended abnormally: {}", e);
            }
        }
        info!("Job scheduler stopped");
    }

    fn is_shut_down(&self) -> bool {
        *self.inner.shutdown_tx.borrow()
    }

    /// Submit a job on behalf of a submitter, subject to rate limiting
    pub async fn submit(&self, request: SubmitRequest) -> Result<String, SchedulerError> {
        let priority = self.validate(&request)?;
        self.inner.rate_limiter.check(&request.submitter_id)?;
        Ok(self.insert(Job::new(request, priority)).await)
    }

    /// Queue a job without consulting the rate limiter
    pub async fn enqueue(&self, request: SubmitRequest) -> Result<String, SchedulerError> {
        let priority = self.validate(&request)?;
        Ok(self.insert(Job::new(request, priority)).await)
    }

    fn validate(&self, request: &SubmitRequest) -> Result<Priority, SchedulerError> {
        if self.is_shut_down() {
            return Err(SchedulerError::ShutDown);
        }
        if request.chapters.is_empty() {
            return Err(SchedulerError::EmptySubmission);
        }
        Priority::try_from(request.priority)
    }

    async fn insert(&self, mut job: Job) -> String {
        job.estimated_seconds = self.estimate_seconds(job.total_bytes());
        let job_id = job.id.clone();
        let priority = job.priority;

        // Persist before the job becomes visible to workers
        self.inner.persist(&job).await;

        info!(
            "Queued job {} for {} ({} chapter(s), priority {:?}, ~{:.1}s)",
            job_id,
            job.submitter_id,
            job.chapters.len(),
            priority,
            job.estimated_seconds
        );

        self.inner
            .jobs
            .write()
            .insert(job_id.clone(), Arc::new(RwLock::new(job)));
        self.inner.queue.lock().push(job_id.clone(), priority);
        self.inner.wake.notify_one();

        job_id
    }

    /// Advisory processing time for a submission of `total_bytes`
    pub fn estimate_seconds(&self, total_bytes: usize) -> f64 {
        let load = self.inner.busy_slots.load(Ordering::SeqCst) as f64 / self.inner.worker_slots as f64;
        total_bytes as f64 / ESTIMATE_UNIT_BYTES * ESTIMATE_SECONDS_PER_UNIT * (1.0 + load)
    }

    fn job_handle(&self, job_id: &str) -> Option<Arc<RwLock<Job>>> {
        self.inner.jobs.read().get(job_id).cloned()
    }

    /// Status summary of a job
    pub fn get_status(&self, job_id: &str) -> Option<JobStatusReport> {
        self.job_handle(job_id).map(|job| job.read().status_report())
    }

    /// Full snapshot of a job
    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.job_handle(job_id).map(|job| job.read().clone())
    }

    /// `(name, translated_text)` per chapter of a completed job
    pub fn get_result(&self, job_id: &str) -> Result<Vec<(String, String)>, SchedulerError> {
        let job = self
            .job_handle(job_id)
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;
        let job = job.read();
        job.result().ok_or(SchedulerError::JobNotCompleted(job.status))
    }

    /// Cancel a queued job owned by `submitter_id`
    pub async fn cancel(&self, job_id: &str, submitter_id: &str) -> Result<(), SchedulerError> {
        let job = self
            .job_handle(job_id)
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;

        let snapshot = {
            let mut guard = job.write();
            if guard.submitter_id != submitter_id {
                return Err(SchedulerError::NotOwner(job_id.to_string()));
            }
            if guard.status != JobStatus::Queued {
                return Err(SchedulerError::NotCancellable(guard.status));
            }
            guard.transition(JobStatus::Cancelled);
            self.inner.queue.lock().remove(job_id);
            guard.clone()
        };

        info!("Cancelled job {}", job_id);
        self.inner.persist(&snapshot).await;
        self.inner.finished.notify_waiters();
        Ok(())
    }

    /// Counts per status, optionally for one submitter, plus slot usage
    pub fn queue_stats(&self, submitter_id: Option<&str>) -> QueueStats {
        let mut stats = QueueStats {
            worker_slots: self.inner.worker_slots,
            busy_slots: self.inner.busy_slots.load(Ordering::SeqCst),
            ..QueueStats::default()
        };

        for job in self.inner.jobs.read().values() {
            let job = job.read();
            if submitter_id.is_none_or(|id| id == job.submitter_id) {
                stats.record(job.status);
            }
        }

        stats
    }

    /// Snapshots of all jobs, optionally for one submitter, oldest first
    pub fn list_jobs(&self, submitter_id: Option<&str>) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .inner
            .jobs
            .read()
            .values()
            .map(|job| job.read().clone())
            .filter(|job| submitter_id.is_none_or(|id| id == job.submitter_id))
            .collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }

    /// Forget a job that is not running
    pub async fn remove_job(&self, job_id: &str) -> Result<Job, SchedulerError> {
        let removed = {
            let mut jobs = self.inner.jobs.write();
            let status = jobs
                .get(job_id)
                .map(|job| job.read().status)
                .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;
            if status == JobStatus::Processing {
                return Err(SchedulerError::NotCancellable(status));
            }
            self.inner.queue.lock().remove(job_id);
            jobs.remove(job_id)
        };

        let job = removed
            .map(|job| job.read().clone())
            .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;

        if let Err(e) = self.inner.backend.delete_job(job_id).await {
            warn!("Failed to delete job {} from the job store: {:#}", job_id, e);
        }
        debug!("Removed job {}", job_id);
        Ok(job)
    }

    /// Drop terminal jobs that finished more than `older_than` ago
    pub async fn purge_finished(&self, older_than: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(older_than)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            return 0;
        };

        let purged: Vec<String> = {
            let mut jobs = self.inner.jobs.write();
            let expired: Vec<String> = jobs
                .iter()
                .filter(|(_, job)| {
                    let job = job.read();
                    job.status.is_terminal() && job.completed_at.unwrap_or(job.updated_at) < cutoff
                })
                .map(|(id, _)| id.clone())
                .collect();
            for id in &expired {
                jobs.remove(id);
            }
            expired
        };

        for id in &purged {
            if let Err(e) = self.inner.backend.delete_job(id).await {
                warn!("Failed to delete job {} from the job store: {:#}", id, e);
            }
        }

        if !purged.is_empty() {
            info!("Purged {} finished job(s)", purged.len());
        }
        purged.len()
    }

    /// Reload the job table from the backend
    ///
    /// Jobs that were processing are failed, queued jobs are queued again in
    /// their original order and finished jobs are kept for queries. Returns
    /// the number of jobs re-queued.
    pub async fn restore(&self) -> Result<usize> {
        let stored = self.inner.backend.load_jobs().await?;
        let mut requeued = 0usize;

        for mut job in stored {
            if self.inner.jobs.read().contains_key(&job.id) {
                continue;
            }

            match job.status {
                JobStatus::Processing => {
                    warn!("Job {} was interrupted; marking it failed", job.id);
                    job.fail(INTERRUPTED_MESSAGE);
                    self.inner.persist(&job).await;
                }
                JobStatus::Queued => {
                    self.inner.queue.lock().push(job.id.clone(), job.priority);
                    requeued += 1;
                }
                _ => {}
            }

            self.inner
                .jobs
                .write()
                .insert(job.id.clone(), Arc::new(RwLock::new(job)));
        }

        if requeued > 0 {
            info!("Restored {} queued job(s)", requeued);
            self.inner.wake.notify_one();
        }
        Ok(requeued)
    }

    /// Wait until the job is completed, failed or cancelled
    pub async fn wait_for_completion(&self, job_id: &str) -> Result<JobStatusReport, SchedulerError> {
        loop {
            let notified = self.inner.finished.notified();
            tokio::pin!(notified);
            // Register before checking so a completion in between is not lost
            notified.as_mut().enable();

            let report = self
                .get_status(job_id)
                .ok_or_else(|| SchedulerError::JobNotFound(job_id.to_string()))?;
            if report.status.is_terminal() {
                return Ok(report);
            }

            notified.await;
        }
    }

    /// Sweep expired cache entries and idle submitters now
    ///
    /// The dispatch loop does this on its own every housekeeping interval.
    pub async fn housekeep(&self) -> (usize, usize) {
        self.inner.housekeep().await
    }

    /// Cache statistics of the shared cache
    pub fn cache(&self) -> &CacheStore {
        &self.inner.cache
    }

    /// Event bus used by workers
    pub fn events(&self) -> &Arc<EventBus> {
        &self.inner.events
    }

    async fn run_loop(inner: Arc<SchedulerInner>, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(inner.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let period = inner.housekeeping_interval;
        let mut housekeeping = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        housekeeping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = inner.wake.notified() => {}
                _ = housekeeping.tick() => {
                    inner.housekeep().await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            if *shutdown_rx.borrow() {
                break;
            }

            Self::dispatch_ready(&inner);
        }

        debug!("Scheduler loop exited");
    }

    /// Hand queued jobs to workers while slots are free
    fn dispatch_ready(inner: &Arc<SchedulerInner>) {
        loop {
            let Ok(permit) = Arc::clone(&inner.slots).try_acquire_owned() else {
                return;
            };

            let Some(job_id) = inner.queue.lock().pop() else {
                return;
            };

            let Some(job) = inner.jobs.read().get(&job_id).cloned() else {
                continue;
            };

            {
                let mut guard = job.write();
                if guard.status != JobStatus::Queued {
                    continue;
                }
                guard.transition(JobStatus::Processing);
            }

            inner.busy_slots.fetch_add(1, Ordering::SeqCst);
            info!("Dispatching job {}", job_id);
            tokio::spawn(Self::run_worker(Arc::clone(inner), job, permit));
        }
    }

    async fn run_worker(inner: Arc<SchedulerInner>, job: Arc<RwLock<Job>>, permit: OwnedSemaphorePermit) {
        let snapshot = job.read().clone();
        inner.persist(&snapshot).await;

        // A panic anywhere in the job surfaces as a JoinError here
        let execution = tokio::spawn(Self::execute_job(Arc::clone(&inner), Arc::clone(&job)));
        let failure = match execution.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(JobExecutionError::WorkerAborted(describe_join_error(e)).to_string()),
        };

        let snapshot = {
            let mut guard = job.write();
            if let Some(message) = failure {
                guard.fail(message);
            }
            guard.clone()
        };

        match snapshot.status {
            JobStatus::Completed => info!(
                "Job {} completed ({} degraded chunk(s))",
                snapshot.id,
                snapshot.degraded_chunks()
            ),
            _ => error!(
                "Job {} failed: {}",
                snapshot.id,
                snapshot.error_message.as_deref().unwrap_or("unknown error")
            ),
        }

        inner.persist(&snapshot).await;

        inner.busy_slots.fetch_sub(1, Ordering::SeqCst);
        drop(permit);

        inner.events.emit_job_completed(&JobCompletedEvent {
            job_id: snapshot.id.clone(),
            status: snapshot.status,
            error_message: snapshot.error_message.clone(),
            timestamp: Utc::now(),
        });

        inner.finished.notify_waiters();
        inner.wake.notify_one();
    }

    async fn execute_job(inner: Arc<SchedulerInner>, job: Arc<RwLock<Job>>) -> Result<(), JobExecutionError> {
        let (job_id, context, options, chapters) = {
            let guard = job.read();
            let chapters: Vec<(String, String)> = guard
                .chapters
                .iter()
                .map(|c| (c.name.clone(), c.source_text.clone()))
                .collect();
            let context = ChunkContext {
                source_language: guard.source_language.clone(),
                target_language: guard.target_language.clone(),
                engine: guard.engine,
            };
            (guard.id.clone(), context, guard.options.clone(), chapters)
        };

        let total = chapters.len();
        for (chapter_index, (name, text)) in chapters.into_iter().enumerate() {
            let chunks: Vec<Chunk> = inner
                .splitter
                .split(&text)
                .into_iter()
                .enumerate()
                .map(|(index, piece)| Chunk::new(&job_id, index, piece))
                .collect();
            let chunk_count = chunks.len();

            inner.events.emit_pre_translation(&PreTranslationEvent {
                job_id: job_id.clone(),
                chapter_index,
                chapter_name: name.clone(),
                char_count: text.chars().count(),
                chunk_count,
            });

            let mut translated: Vec<Chunk> = stream::iter(chunks.into_iter().map(|chunk| {
                let inner = Arc::clone(&inner);
                let context = context.clone();
                async move { inner.translate_chunk(chunk, &context).await }
            }))
            .buffer_unordered(inner.chunk_fan_out)
            .collect()
            .await;
            translated.sort_by_key(|chunk| chunk.index);

            if let Some(index) = first_gap(&translated, chunk_count) {
                return Err(JobExecutionError::MissingChunk {
                    chapter: chapter_index,
                    index,
                });
            }

            let chapter_text = assemble_chapter(&text, &translated, &options);
            let progress = ((chapter_index + 1) * 100 / total) as u8;
            let post_event = PostTranslationEvent {
                job_id: job_id.clone(),
                chapter_index,
                chapter_name: name,
                total_chunks: chunk_count,
                cached_chunks: count_status(&translated, ChunkStatus::Cached),
                degraded_chunks: count_status(&translated, ChunkStatus::Degraded),
            };

            {
                let mut guard = job.write();
                let chapter = guard.chapters.get_mut(chapter_index).ok_or_else(|| {
                    JobExecutionError::Other(format!("Chapter {} disappeared from job", chapter_index))
                })?;
                chapter.chunks = translated;
                chapter.translated_text = Some(chapter_text);
                guard.progress_percent = progress;
                guard.updated_at = Utc::now();
            }

            debug!("Job {} chapter {}/{} done ({}%)", job_id, chapter_index + 1, total, progress);
            inner.events.emit_post_translation(&post_event);
            if let Some(callback) = &inner.progress {
                callback(&job_id, progress);
            }
        }

        let mut guard = job.write();
        guard.progress_percent = 100;
        guard.transition(JobStatus::Completed);
        Ok(())
    }
}

impl SchedulerInner {
    async fn persist(&self, job: &Job) {
        if let Err(e) = self.backend.save_job(job).await {
            warn!("Failed to persist job {}: {:#}", job.id, e);
        }
    }

    /// Returns `(expired cache entries, idle submitters)` removed
    async fn housekeep(&self) -> (usize, usize) {
        let expired = self.cache.purge_expired().await;
        let idle = self.rate_limiter.purge_stale();
        if expired > 0 || idle > 0 {
            debug!(
                "Housekeeping dropped {} expired cache entries and {} idle submitter(s)",
                expired, idle
            );
        }
        (expired, idle)
    }

    /// Cache first, engine on miss; degraded results are never cached
    async fn translate_chunk(&self, mut chunk: Chunk, context: &ChunkContext) -> Chunk {
        if chunk.source_text.trim().is_empty()
            || EngineAdapter::is_passthrough(&context.source_language, &context.target_language)
        {
            chunk.translated_text = Some(chunk.source_text.clone());
            chunk.status = ChunkStatus::Translated;
            return chunk;
        }

        let fingerprint = cache::fingerprint(
            &chunk.source_text,
            &context.source_language,
            &context.target_language,
            context.engine,
        );

        if let Some(text) = self.cache.lookup(&fingerprint).await {
            chunk.translated_text = Some(text);
            chunk.status = ChunkStatus::Cached;
            return chunk;
        }

        let result = self
            .engine
            .translate(
                &chunk.source_text,
                &context.source_language,
                &context.target_language,
                context.engine,
            )
            .await;

        if result.degraded {
            chunk.status = ChunkStatus::Degraded;
        } else {
            self.cache.store_default(&fingerprint, &result.text).await;
            chunk.status = ChunkStatus::Translated;
        }
        chunk.translated_text = Some(result.text);
        chunk
    }
}

/// First index missing from a sorted chunk list
fn first_gap(chunks: &[Chunk], expected: usize) -> Option<usize> {
    chunks
        .iter()
        .enumerate()
        .find(|(position, chunk)| chunk.index != *position)
        .map(|(position, _)| position)
        .or((chunks.len() < expected).then_some(chunks.len()))
}

fn count_status(chunks: &[Chunk], status: ChunkStatus) -> usize {
    chunks.iter().filter(|chunk| chunk.status == status).count()
}

/// Concatenate chunk translations in order and apply job options
fn assemble_chapter(source_text: &str, chunks: &[Chunk], options: &JobOptions) -> String {
    // Whitespace-only chapters have no chunks and pass through
    let text: String = if chunks.is_empty() {
        source_text.to_string()
    } else {
        chunks
            .iter()
            .map(|chunk| chunk.translated_text.as_deref().unwrap_or(&chunk.source_text))
            .collect()
    };

    if options.replace_quotes {
        formatting::replace_quotes(&text).into_owned()
    } else {
        text
    }
}

fn describe_join_error(error: JoinError) -> String {
    if !error.is_panic() {
        return "task was cancelled".to_string();
    }
    let panic = error.into_panic();
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
