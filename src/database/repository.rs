/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for job and cache persistence,
 * abstracting away the SQL details.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{params, OptionalExtension, Row};

use super::connection::DatabaseConnection;
use super::models::{CacheRecord, JobRecord};

/// Repository for database operations
#[derive(Clone, Debug)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Job Operations
    // =========================================================================

    /// Insert or replace a job snapshot
    pub async fn save_job(&self, record: &JobRecord) -> Result<()> {
        let record = record.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO jobs (id, submitter_id, status, priority, created_at, updated_at, payload)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(id) DO UPDATE SET
                        status = excluded.status,
                        updated_at = excluded.updated_at,
                        payload = excluded.payload
                    "#,
                    params![
                        record.id,
                        record.submitter_id,
                        record.status,
                        record.priority,
                        record.created_at,
                        record.updated_at,
                        record.payload,
                    ],
                )?;
                debug!("Saved job {} ({})", record.id, record.status);
                Ok(())
            })
            .await
    }

    /// Load every persisted job, oldest first
    pub async fn load_jobs(&self) -> Result<Vec<JobRecord>> {
        self.db
            .execute_async(|conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, submitter_id, status, priority, created_at, updated_at, payload
                    FROM jobs
                    ORDER BY created_at ASC
                    "#,
                )?;

                let records = stmt
                    .query_map([], Self::row_to_job)?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(records)
            })
            .await
    }

    /// Delete a job; returns whether a row was removed
    pub async fn delete_job(&self, job_id: &str) -> Result<bool> {
        let job_id = job_id.to_string();

        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM jobs WHERE id = ?1", [job_id])?;
                Ok(deleted > 0)
            })
            .await
    }

    fn row_to_job(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
        Ok(JobRecord {
            id: row.get(0)?,
            submitter_id: row.get(1)?,
            status: row.get(2)?,
            priority: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            payload: row.get(6)?,
        })
    }

    // =========================================================================
    // Cache Operations
    // =========================================================================

    /// Get a live cache entry, bumping its hit count
    pub async fn get_cached(&self, fingerprint: &str, now_ms: i64) -> Result<Option<CacheRecord>> {
        let fingerprint = fingerprint.to_string();

        self.db
            .execute_async(move |conn| {
                let record = conn
                    .query_row(
                        r#"
                        SELECT fingerprint, translated_text, created_at, expires_at, hit_count
                        FROM translation_cache
                        WHERE fingerprint = ?1 AND expires_at > ?2
                        "#,
                        params![fingerprint, now_ms],
                        |row| {
                            Ok(CacheRecord {
                                fingerprint: row.get(0)?,
                                translated_text: row.get(1)?,
                                created_at: row.get(2)?,
                                expires_at: row.get(3)?,
                                hit_count: row.get(4)?,
                            })
                        },
                    )
                    .optional()?;

                if record.is_some() {
                    conn.execute(
                        "UPDATE translation_cache SET hit_count = hit_count + 1 WHERE fingerprint = ?1",
                        [&fingerprint],
                    )?;
                }

                Ok(record)
            })
            .await
    }

    /// Insert or overwrite a cache entry
    pub async fn put_cached(&self, record: &CacheRecord) -> Result<()> {
        let record = record.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translation_cache (fingerprint, translated_text, created_at, expires_at, hit_count)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(fingerprint) DO UPDATE SET
                        translated_text = excluded.translated_text,
                        created_at = excluded.created_at,
                        expires_at = excluded.expires_at
                    "#,
                    params![
                        record.fingerprint,
                        record.translated_text,
                        record.created_at,
                        record.expires_at,
                        record.hit_count,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Delete entries that expired at or before `now_ms`
    pub async fn purge_expired_cache(&self, now_ms: i64) -> Result<usize> {
        self.db
            .execute_async(move |conn| {
                let deleted =
                    conn.execute("DELETE FROM translation_cache WHERE expires_at <= ?1", [now_ms])?;
                Ok(deleted)
            })
            .await
    }
}
