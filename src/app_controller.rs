use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::sync::Arc;

use crate::app_config::{CacheBackendKind, Config};
use crate::database::{DatabaseConnection, DatabaseStats, Repository};
use crate::scheduler::{
    JobOptions, JobQueueBackend, JobScheduler, JobStatus, MemoryJobBackend, ProgressCallback, SqliteJobBackend,
    SubmitRequest,
};
use crate::translation::cache::{CacheBackend, CacheStore, MemoryCacheBackend, SqliteCacheBackend};
use crate::translation::engine::EngineAdapter;
use crate::translation::splitter::ChunkSplitter;

/// Wires a `Config` into engines, cache, job store and scheduler
pub struct Controller {
    config: Config,
    scheduler: JobScheduler,
    repository: Option<Repository>,
}

impl Controller {
    /// Create a controller with default configuration and in-memory stores
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a controller with the HTTP engines described by the config
    pub fn with_config(config: Config) -> Result<Self> {
        let engine = EngineAdapter::from_config(&config);
        Self::build(config, engine, None)
    }

    /// Create a controller around a prepared engine adapter
    pub fn build(config: Config, engine: EngineAdapter, progress: Option<ProgressCallback>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let repository = if config.needs_database() {
            let path = config.database_path()?;
            let db = DatabaseConnection::new(&path)
                .with_context(|| format!("Failed to open database at {:?}", path))?;
            Some(Repository::new(db))
        } else {
            None
        };

        let cache_backend: Arc<dyn CacheBackend> = match (&config.cache.backend, &repository) {
            (CacheBackendKind::Sqlite, Some(repo)) => Arc::new(SqliteCacheBackend::new(repo.clone())),
            _ => Arc::new(MemoryCacheBackend::new()),
        };
        let cache = CacheStore::new(cache_backend, config.cache.enabled, config.cache.ttl());

        let job_backend: Arc<dyn JobQueueBackend> = match &repository {
            Some(repo) if config.scheduler.persist_jobs => Arc::new(SqliteJobBackend::new(repo.clone())),
            _ => Arc::new(MemoryJobBackend::new()),
        };

        debug!(
            "Cache backend: {}, job store: {}",
            cache.backend_name(),
            if config.scheduler.persist_jobs { "sqlite" } else { "memory" }
        );

        let mut builder = JobScheduler::builder(engine)
            .config(config.scheduler.clone())
            .splitter(ChunkSplitter::new(&config.splitter))
            .cache(cache)
            .backend(job_backend);
        if let Some(progress) = progress {
            builder = builder.progress_callback(progress);
        }

        Ok(Self {
            config,
            scheduler: builder.build(),
            repository,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    /// Restore persisted jobs and start dispatching
    pub async fn start(&self) -> Result<usize> {
        let restored = self.scheduler.restore().await?;
        self.scheduler.start();
        Ok(restored)
    }

    /// Translate chapters end to end with the configured languages
    ///
    /// Goes through the rate limiter like any other submission.
    pub async fn translate_chapters(
        &self,
        submitter_id: &str,
        chapters: Vec<(String, String)>,
        options: JobOptions,
    ) -> Result<Vec<(String, String)>> {
        let request = SubmitRequest::new(
            submitter_id,
            chapters,
            self.config.source_language.clone(),
            self.config.target_language.clone(),
        )
        .with_engine(self.config.engines.default_engine)
        .with_options(options);

        let job_id = self.scheduler.submit(request).await?;
        info!("Submitted job {}", job_id);

        let report = self.scheduler.wait_for_completion(&job_id).await?;
        match report.status {
            JobStatus::Completed => Ok(self.scheduler.get_result(&job_id)?),
            status => Err(anyhow!(
                "Job {} ended as {}: {}",
                job_id,
                status,
                report.error_message.unwrap_or_default()
            )),
        }
    }

    /// Stop the scheduler and run a last housekeeping sweep
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        self.scheduler.housekeep().await;
    }

    /// Database statistics, when a database is open
    pub fn database_stats(&self) -> Option<Result<DatabaseStats>> {
        self.repository.as_ref().map(|repo| repo.connection().stats())
    }
}
