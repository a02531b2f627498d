/*!
 * Error types for the chapterflow pipeline.
 *
 * Each layer of the pipeline has its own error enum, using the thiserror
 * crate for ergonomic definitions. Engine and cache errors are absorbed
 * inside the pipeline; scheduler errors are what callers of the
 * submission API see.
 */

use std::time::Duration;

use thiserror::Error;

use crate::scheduler::models::JobStatus;

/// Errors raised by a translation engine
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Network failure, timeout or server-side error; worth retrying
    #[error("Transient engine error: {0}")]
    Transient(String),

    /// Invalid credentials, unsupported language pair or malformed request
    #[error("Permanent engine error: {0}")]
    Permanent(String),

    /// The engine is not configured (e.g. missing API key)
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Transient(_))
    }
}

/// Errors raised by a cache backend
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backing store failed
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<anyhow::Error> for CacheError {
    fn from(error: anyhow::Error) -> Self {
        Self::Backend(error.to_string())
    }
}

/// A submitter tried to start new work too soon
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Rate limit exceeded for submitter {submitter_id}: retry after {}s", retry_after.as_secs())]
pub struct RateLimitExceeded {
    /// Submitter that was rejected
    pub submitter_id: String,
    /// Remaining wait before a new submission is accepted
    pub retry_after: Duration,
}

/// A chunk longer than the engine hard limit reached the engine layer
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Chunk of {length} chars exceeds the hard limit of {limit}")]
pub struct ChunkOverflow {
    /// Length of the offending chunk in chars
    pub length: usize,
    /// Configured hard limit
    pub limit: usize,
}

/// Unexpected failure while orchestrating a job
#[derive(Error, Debug)]
pub enum JobExecutionError {
    /// Reassembled chunks were not contiguous
    #[error("Chapter {chapter} is missing chunk {index}")]
    MissingChunk {
        /// Chapter index
        chapter: usize,
        /// First missing chunk index
        index: usize,
    },

    /// A worker task panicked or was aborted
    #[error("Worker task aborted: {0}")]
    WorkerAborted(String),

    /// Any other orchestration defect
    #[error("{0}")]
    Other(String),
}

/// Errors returned by the scheduler API
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The submitter is rate limited
    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),

    /// Priority outside 1..=4
    #[error("Invalid priority: {0} (expected 1-4)")]
    InvalidPriority(u8),

    /// A submission without chapters
    #[error("Submission contains no chapters")]
    EmptySubmission,

    /// No job with that id
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// The job exists but has no result yet
    #[error("Job is not completed (status: {0})")]
    JobNotCompleted(JobStatus),

    /// Only queued jobs can be cancelled
    #[error("Job cannot be cancelled in status {0}")]
    NotCancellable(JobStatus),

    /// The job belongs to another submitter
    #[error("Job {0} does not belong to this submitter")]
    NotOwner(String),

    /// The scheduler has been shut down
    #[error("Scheduler is shut down")]
    ShutDown,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from an engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Error from the cache
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error from the scheduler
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
