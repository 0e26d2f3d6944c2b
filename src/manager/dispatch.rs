//! Job submission and worker spawning.

use chrono::Utc;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::registry::Job;
use crate::types::{JobId, JobStatus, SourceDescriptor};

use super::DownloadManager;
use super::worker::{WorkerContext, run_worker, spawn_termination_monitor};

impl DownloadManager {
    /// Submit one logical unit of download work
    ///
    /// Validates the descriptor, registers a `Running` job under a fresh
    /// collision-resistant ID, spawns an isolated worker for it, and returns
    /// the ID immediately - this method never waits for the download. The
    /// outcome arrives through [`subscribe`](DownloadManager::subscribe)
    /// notifications and [`status`](DownloadManager::status) lookups.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSource`] if the URL is empty; nothing is registered
    ///   and no worker is spawned.
    /// - [`Error::ShuttingDown`] after [`shutdown`](DownloadManager::shutdown)
    ///   has been called.
    pub async fn submit(&self, source: SourceDescriptor) -> Result<JobId> {
        if source.url.trim().is_empty() {
            return Err(Error::InvalidSource {
                message: "url must not be empty".into(),
            });
        }

        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }

        let job_id = JobId::generate();

        // Register before spawning so the router never sees a message for a
        // job it doesn't know about.
        self.registry
            .insert(Job {
                id: job_id,
                source: source.clone(),
                status: JobStatus::Running,
                worker: None,
                error: None,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            job_id = %job_id,
            url = %source.url,
            kind = ?source.kind,
            "Job submitted"
        );

        let ctx = WorkerContext {
            job_id,
            source,
            fetcher: Arc::clone(&self.fetcher),
            events: self.event_tx.clone(),
            permits: self.concurrency.clone(),
        };
        let handle = tokio::spawn(run_worker(ctx));
        let abort = handle.abort_handle();

        // The worker may already have finished; never re-arm the handle on a
        // record the router has made terminal.
        self.registry
            .with_mut(job_id, |job| {
                if !job.status.is_terminal() {
                    job.worker = Some(abort);
                }
            })
            .await;

        spawn_termination_monitor(job_id, handle, self.event_tx.clone());

        Ok(job_id)
    }
}
