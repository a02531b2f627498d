/*!
 * Job scheduling for chapter translation.
 *
 * - `models`: Jobs, chunks, priorities and caller-facing reports
 * - `queue`: Priority queue with FIFO tie-breaking
 * - `rate_limiter`: Per-submitter submission gate
 * - `store`: Job table persistence backends
 * - `core`: The scheduler itself
 */

pub mod core;
pub mod models;
pub mod queue;
pub mod rate_limiter;
pub mod store;

pub use self::core::{JobScheduler, JobSchedulerBuilder, ProgressCallback};
pub use self::models::{
    Chapter, Chunk, ChunkStatus, Job, JobOptions, JobStatus, JobStatusReport, Priority, QueueStats, SubmitRequest,
};
pub use self::rate_limiter::{MemoryRateLimitStore, RateLimitState, RateLimitStore, RateLimiter};
pub use self::store::{JobQueueBackend, MemoryJobBackend, SqliteJobBackend};
