/*!
 * Database entity models.
 *
 * These structures map directly to database tables. Domain types are
 * converted to and from them at the store boundary.
 */

use serde::{Deserialize, Serialize};

/// Row of the `jobs` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job identifier
    pub id: String,
    /// Who submitted the job
    pub submitter_id: String,
    /// Lifecycle status as its snake_case name
    pub status: String,
    /// Priority 1..=4
    pub priority: i64,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
    /// Full job snapshot as JSON
    pub payload: String,
}

/// Row of the `translation_cache` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Fingerprint of (text, source, target, engine)
    pub fingerprint: String,
    /// Cached translation
    pub translated_text: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Expiry as unix milliseconds
    pub expires_at: i64,
    /// Number of lookups served
    pub hit_count: i64,
}

impl CacheRecord {
    /// Whether the record is still valid at the given unix milliseconds
    pub fn is_live_at(&self, now_ms: i64) -> bool {
        self.expires_at > now_ms
    }
}
