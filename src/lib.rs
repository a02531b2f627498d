/*!
 * # chapterflow - chunked translation job pipeline
 *
 * A Rust library for translating long-form text (book chapters, scraped
 * posts) through third-party translation engines.
 *
 * ## Features
 *
 * - Engine-safe chunking under soft and hard size limits
 * - Fingerprint cache with in-memory or SQLite backing
 * - Google (default) and DeepL engines with retry and fallback
 * - Priority job queue with bounded worker slots and progress reporting
 * - Per-submitter rate limiting
 * - Job table persistence and restore
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: Chunk-level pipeline:
 *   - `translation::splitter`: Text chunking
 *   - `translation::cache`: Translation cache
 *   - `translation::engine`: Engine adapter with fallback
 *   - `translation::events`: Typed translation hooks
 * - `providers`: Engine clients (Google, DeepL, mock)
 * - `scheduler`: Job queue, rate limiter and workers
 * - `database`: SQLite persistence
 * - `app_controller`: Wiring for applications
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod scheduler;
pub mod translation;

pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, EngineError, SchedulerError};
pub use language_utils::{get_language_name, language_codes_match};
pub use scheduler::{JobScheduler, JobStatus, SubmitRequest};
pub use translation::{CacheStore, ChunkSplitter, EngineAdapter};
