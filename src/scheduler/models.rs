/*!
 * Job models and DTOs.
 *
 * A `Job` is owned by the scheduler; callers only ever see cloned
 * snapshots or the smaller `JobStatusReport`.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app_config::EngineKind;
use crate::errors::SchedulerError;

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a worker slot
    Queued,
    /// A worker is translating it
    Processing,
    /// Every chapter has a translated text
    Completed,
    /// Orchestration failed; see `error_message`
    Failed,
    /// Removed from the queue before it started
    Cancelled,
}

impl JobStatus {
    /// Whether the job will never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// snake_case name, as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// Job priority; higher runs first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Low = 1,
    #[default]
    Normal = 2,
    High = 3,
    Urgent = 4,
}

impl TryFrom<u8> for Priority {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Normal),
            3 => Ok(Priority::High),
            4 => Ok(Priority::Urgent),
            other => Err(SchedulerError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

/// Status of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Pending,
    /// Translated by an engine
    Translated,
    /// Served from the cache
    Cached,
    /// Every engine failed; the original text was kept
    Degraded,
}

/// An engine-safe slice of a chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub job_id: String,
    /// Position within the chapter, contiguous from 0
    pub index: usize,
    pub source_text: String,
    pub translated_text: Option<String>,
    pub status: ChunkStatus,
}

impl Chunk {
    /// Create a pending chunk
    pub fn new(job_id: &str, index: usize, source_text: String) -> Self {
        Self {
            job_id: job_id.to_string(),
            index,
            source_text,
            translated_text: None,
            status: ChunkStatus::Pending,
        }
    }
}

/// One named chapter of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub name: String,
    pub source_text: String,
    /// Filled when the chapter is split by the worker
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    pub translated_text: Option<String>,
}

impl Chapter {
    pub fn new(name: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_text: source_text.into(),
            chunks: Vec::new(),
            translated_text: None,
        }
    }
}

/// Per-job options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Replace quotes in the translated text with `―`
    #[serde(default)]
    pub replace_quotes: bool,
}

/// A translation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub submitter_id: String,
    pub priority: Priority,
    pub source_language: String,
    pub target_language: String,
    pub engine: EngineKind,
    #[serde(default)]
    pub options: JobOptions,
    pub chapters: Vec<Chapter>,
    pub status: JobStatus,
    /// 0..=100, advanced after each chapter
    pub progress_percent: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    /// Advisory processing time estimate
    pub estimated_seconds: f64,
}

impl Job {
    /// Create a queued job from a validated submission
    pub fn new(request: SubmitRequest, priority: Priority) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            submitter_id: request.submitter_id,
            priority,
            source_language: request.source_language,
            target_language: request.target_language,
            engine: request.engine,
            options: request.options,
            chapters: request
                .chapters
                .into_iter()
                .map(|(name, text)| Chapter::new(name, text))
                .collect(),
            status: JobStatus::Queued,
            progress_percent: 0,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            error_message: None,
            estimated_seconds: 0.0,
        }
    }

    /// Total size of all chapters in bytes
    pub fn total_bytes(&self) -> usize {
        self.chapters.iter().map(|c| c.source_text.len()).sum()
    }

    /// Number of chunks that kept their original text
    pub fn degraded_chunks(&self) -> usize {
        self.chapters
            .iter()
            .flat_map(|c| c.chunks.iter())
            .filter(|chunk| chunk.status == ChunkStatus::Degraded)
            .count()
    }

    /// `(name, translated_text)` per chapter, once completed
    pub fn result(&self) -> Option<Vec<(String, String)>> {
        if self.status != JobStatus::Completed {
            return None;
        }
        Some(
            self.chapters
                .iter()
                .map(|c| (c.name.clone(), c.translated_text.clone().unwrap_or_default()))
                .collect(),
        )
    }

    /// Status summary for callers
    pub fn status_report(&self) -> JobStatusReport {
        JobStatusReport {
            job_id: self.id.clone(),
            status: self.status,
            progress_percent: self.progress_percent,
            error_message: self.error_message.clone(),
            estimated_seconds: self.estimated_seconds,
        }
    }

    /// Move to a new status, stamping the relevant timestamps
    pub fn transition(&mut self, status: JobStatus) {
        let now = Utc::now();
        match status {
            JobStatus::Processing => self.started_at = Some(now),
            s if s.is_terminal() => self.completed_at = Some(now),
            _ => {}
        }
        self.status = status;
        self.updated_at = now;
    }

    /// Mark failed with a message
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
        self.transition(JobStatus::Failed);
    }
}

/// A submission to the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// `(name, text)` per chapter, in order
    pub chapters: Vec<(String, String)>,
    /// 1..=4, validated at submission
    pub priority: u8,
    pub source_language: String,
    pub target_language: String,
    pub engine: EngineKind,
    pub submitter_id: String,
    #[serde(default)]
    pub options: JobOptions,
}

impl SubmitRequest {
    /// Normal-priority request using the default engine
    pub fn new(
        submitter_id: impl Into<String>,
        chapters: Vec<(String, String)>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            chapters,
            priority: Priority::Normal.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            engine: EngineKind::default(),
            submitter_id: submitter_id.into(),
            options: JobOptions::default(),
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }
}

/// Progress summary of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub job_id: String,
    pub status: JobStatus,
    pub progress_percent: u8,
    pub error_message: Option<String>,
    pub estimated_seconds: f64,
}

/// Counts per status plus slot usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub worker_slots: usize,
    pub busy_slots: usize,
}

impl QueueStats {
    /// Count one job
    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Queued => self.queued += 1,
            JobStatus::Processing => self.processing += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Cancelled => self.cancelled += 1,
        }
    }

    /// Number of jobs counted
    pub fn total(&self) -> usize {
        self.queued + self.processing + self.completed + self.failed + self.cancelled
    }
}
