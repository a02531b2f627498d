//! Persistence of the job table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::warn;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;

use super::models::Job;
use crate::database::models::JobRecord;
use crate::database::Repository;

/// Storage for job snapshots
#[async_trait]
pub trait JobQueueBackend: Send + Sync + Debug {
    /// Insert or replace a job
    async fn save_job(&self, job: &Job) -> Result<()>;

    /// Every stored job, oldest first; rows that cannot be decoded are skipped
    async fn load_jobs(&self) -> Result<Vec<Job>>;

    /// Delete a job; returns whether it existed
    async fn delete_job(&self, job_id: &str) -> Result<bool>;
}

/// Job table that lives and dies with the process
#[derive(Debug, Default)]
pub struct MemoryJobBackend {
    jobs: RwLock<HashMap<String, Job>>,
}

impl MemoryJobBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueueBackend for MemoryJobBackend {
    async fn save_job(&self, job: &Job) -> Result<()> {
        self.jobs.write().insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn load_jobs(&self) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self.jobs.read().values().cloned().collect();
        jobs.sort_by_key(|job| job.created_at);
        Ok(jobs)
    }

    async fn delete_job(&self, job_id: &str) -> Result<bool> {
        Ok(self.jobs.write().remove(job_id).is_some())
    }
}

/// Job table in the SQLite `jobs` table, one JSON payload per job
#[derive(Debug, Clone)]
pub struct SqliteJobBackend {
    repository: Repository,
}

impl SqliteJobBackend {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    fn to_record(job: &Job) -> Result<JobRecord> {
        Ok(JobRecord {
            id: job.id.clone(),
            submitter_id: job.submitter_id.clone(),
            status: job.status.to_string(),
            priority: i64::from(u8::from(job.priority)),
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
            payload: serde_json::to_string(job).context("Failed to serialize job")?,
        })
    }
}

#[async_trait]
impl JobQueueBackend for SqliteJobBackend {
    async fn save_job(&self, job: &Job) -> Result<()> {
        let record = Self::to_record(job)?;
        self.repository.save_job(&record).await
    }

    async fn load_jobs(&self) -> Result<Vec<Job>> {
        let records = self.repository.load_jobs().await?;
        let mut jobs: Vec<Job> = records
            .iter()
            .filter_map(|record| match serde_json::from_str::<Job>(&record.payload) {
                Ok(job) => Some(job),
                Err(e) => {
                    // Left in the table for inspection; one bad row must not hide the rest
                    warn!("Skipping job {} ({}): corrupt payload: {}", record.id, record.status, e);
                    None
                }
            })
            .collect();
        // RFC 3339 strings with mixed offsets do not sort lexically
        jobs.sort_by_key(|job| job.created_at);
        Ok(jobs)
    }

    async fn delete_job(&self, job_id: &str) -> Result<bool> {
        self.repository.delete_job(job_id).await
    }
}
