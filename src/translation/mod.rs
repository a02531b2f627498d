/*!
 * Chunk-level translation pipeline.
 *
 * This module contains everything a worker needs to translate one chapter.
 * It is split into several submodules:
 *
 * - `splitter`: Engine-safe chunking of long text
 * - `cache`: Fingerprint cache with pluggable backends
 * - `engine`: Engine selection, retry and fallback
 * - `events`: Typed hooks around chapter translation
 * - `formatting`: Post-processing of translated text
 */

pub use self::cache::{CacheBackend, CacheStats, CacheStore, MemoryCacheBackend, SqliteCacheBackend};
pub use self::engine::{ChunkTranslation, EngineAdapter};
pub use self::events::EventBus;
pub use self::splitter::ChunkSplitter;

pub mod cache;
pub mod engine;
pub mod events;
pub mod formatting;
pub mod splitter;
