/*!
 * Translation caching functionality.
 *
 * This module provides caching mechanisms for translations to avoid
 * redundant engine calls. Entries are keyed by a fingerprint of the
 * translation unit and expire after a TTL. The store sits on top of a
 * pluggable backend: an in-process map or the SQLite cache table.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{CacheConfig, EngineKind};
use crate::database::models::CacheRecord;
use crate::database::Repository;
use crate::errors::CacheError;

/// Fingerprint of a translation unit
///
/// SHA-256 over the text, both languages and the engine, with a NUL byte
/// between fields so that ("ab", "c") and ("a", "bc") never collide.
pub fn fingerprint(text: &str, source_language: &str, target_language: &str, engine: EngineKind) -> String {
    let mut hasher = Sha256::new();
    for field in [text, source_language, target_language, engine.as_str()] {
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// A cached translation
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Key of the entry
    pub fingerprint: String,
    /// Cached translation
    pub translated_text: String,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// How long the entry stays valid
    pub ttl: Duration,
}

impl CacheEntry {
    /// Create an entry written now
    pub fn new(fingerprint: impl Into<String>, translated_text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            translated_text: translated_text.into(),
            created_at: Utc::now(),
            ttl,
        }
    }

    /// Expiry instant; saturates instead of overflowing on huge TTLs
    pub fn expires_at(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the entry is expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Storage behind a `CacheStore`
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Get a live value; expired entries are misses
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set a value that expires after `ttl`
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Drop expired entries, returning how many were removed
    async fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(0)
    }
}

/// In-process cache backend
#[derive(Debug, Default)]
pub struct MemoryCacheBackend {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCacheBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the backend holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Insert a prepared entry (used to seed entries with a past timestamp)
    pub fn insert_entry(&self, entry: CacheEntry) {
        self.entries.write().insert(entry.fingerprint.clone(), entry);
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Utc::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired_at(now) => return Ok(Some(entry.translated_text.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict, unless a fresh value was stored in between
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.insert_entry(CacheEntry::new(key, value, ttl));
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        Ok(before - entries.len())
    }
}

/// Cache backend on the SQLite `translation_cache` table
#[derive(Debug, Clone)]
pub struct SqliteCacheBackend {
    repository: Repository,
}

impl SqliteCacheBackend {
    /// Create a backend over an open repository
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CacheBackend for SqliteCacheBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let record = self
            .repository
            .get_cached(key, Utc::now().timestamp_millis())
            .await?;
        Ok(record.map(|r| r.translated_text))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, value, ttl);
        let record = CacheRecord {
            fingerprint: entry.fingerprint.clone(),
            translated_text: entry.translated_text.clone(),
            created_at: entry.created_at.to_rfc3339(),
            expires_at: entry.expires_at().timestamp_millis(),
            hit_count: 0,
        };
        self.repository.put_cached(&record).await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(self
            .repository
            .purge_expired_cache(Utc::now().timestamp_millis())
            .await?)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that found nothing
    pub misses: usize,
    /// Backend failures (lookups and stores)
    pub errors: usize,
    /// hits / (hits + misses), 0 when no lookups happened
    pub hit_rate: f64,
}

/// Translation cache for storing and retrieving translations
///
/// Backend failures never surface to callers: a failed lookup is a miss
/// and a failed store is dropped.
#[derive(Debug, Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
    enabled: bool,
    default_ttl: Duration,
}

impl CacheStore {
    /// Create a store over a backend
    pub fn new(backend: Arc<dyn CacheBackend>, enabled: bool, default_ttl: Duration) -> Self {
        Self {
            backend,
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
            errors: Arc::new(AtomicUsize::new(0)),
            enabled,
            default_ttl,
        }
    }

    /// In-memory store with the given config
    pub fn in_memory(config: &CacheConfig) -> Self {
        Self::new(Arc::new(MemoryCacheBackend::new()), config.enabled, config.ttl())
    }

    /// A store that never caches
    pub fn disabled() -> Self {
        Self::new(Arc::new(MemoryCacheBackend::new()), false, Duration::ZERO)
    }

    /// Get a translation from the cache
    pub async fn lookup(&self, fingerprint: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        match self.backend.get(fingerprint).await {
            Ok(Some(text)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for {}", short(fingerprint));
                Some(text)
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss for {}", short(fingerprint));
                None
            }
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                warn!("Cache lookup on {} backend failed, treating as miss: {}", self.backend.name(), e);
                None
            }
        }
    }

    /// Store a translation with an explicit TTL
    pub async fn store(&self, fingerprint: &str, text: &str, ttl: Duration) {
        if !self.enabled {
            return;
        }

        match self.backend.set_with_ttl(fingerprint, text, ttl).await {
            Ok(()) => debug!("Cached translation for {}", short(fingerprint)),
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!("Cache store on {} backend failed: {}", self.backend.name(), e);
            }
        }
    }

    /// Store a translation with the configured TTL
    pub async fn store_default(&self, fingerprint: &str, text: &str) {
        self.store(fingerprint, text, self.default_ttl).await;
    }

    /// Drop expired entries from the backend
    pub async fn purge_expired(&self) -> usize {
        match self.backend.purge_expired().await {
            Ok(removed) => {
                if removed > 0 {
                    debug!("Purged {} expired cache entries", removed);
                }
                removed
            }
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!("Cache purge on {} backend failed: {}", self.backend.name(), e);
                0
            }
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            hits,
            misses,
            errors: self.errors.load(Ordering::Relaxed),
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
        }
    }

    /// Configured TTL
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Name of the backing store
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
