//! Core download manager implementation split into focused submodules.
//!
//! The `DownloadManager` struct and its methods are organized by domain:
//! - [`dispatch`] - Job submission and worker spawning
//! - [`worker`] - Worker execution and termination monitoring
//! - [`router`] - Message routing, registry updates, and eviction

mod dispatch;
mod router;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, broadcast, mpsc};

use crate::config::Config;
use crate::error::Result;
use crate::fetch::FetchRoutine;
use crate::registry::JobRegistry;
use crate::types::{JobId, JobSnapshot, Notification};

use router::{EventRouter, RouterEvent};

/// How long `shutdown` waits for running jobs before giving up
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Main download manager instance (cloneable - all fields are Arc-wrapped)
///
/// Owns the job registry, spawns one isolated worker task per submitted job,
/// and fans worker messages out to subscribers as [`Notification`]s. All
/// registry mutation after submission happens on a single router task, so no
/// job record ever has concurrent writers.
#[derive(Clone)]
pub struct DownloadManager {
    /// Configuration (wrapped in Arc for sharing across tasks)
    config: Arc<Config>,
    /// Registry of all known jobs
    registry: JobRegistry,
    /// Fetch routine shared by all workers
    fetcher: Arc<dyn FetchRoutine>,
    /// Notification broadcast channel sender (multiple subscribers supported)
    notification_tx: broadcast::Sender<Notification>,
    /// Sender side of the worker-to-router message channel
    event_tx: mpsc::Sender<RouterEvent>,
    /// Optional bound on concurrently fetching workers
    concurrency: Option<Arc<Semaphore>>,
    /// Flag cleared during shutdown so new submissions are rejected
    accepting_new: Arc<AtomicBool>,
}

impl DownloadManager {
    /// Create a new download manager
    ///
    /// Validates the configuration, sets up the notification broadcast
    /// channel, and spawns the event router task. The router owns all job
    /// mutation from this point on; it stops on its own once the manager and
    /// every worker have been dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// is invalid.
    pub fn new(config: Config, fetcher: Arc<dyn FetchRoutine>) -> Result<Self> {
        config.validate()?;

        let (notification_tx, _rx) = broadcast::channel(config.notification_capacity);
        let (event_tx, event_rx) = mpsc::channel(config.message_capacity);

        let registry = JobRegistry::new();
        let router = EventRouter::new(
            registry.clone(),
            notification_tx.clone(),
            config.retention_window(),
        );
        router.spawn(event_rx);

        let concurrency = config
            .max_concurrent_jobs
            .map(|bound| Arc::new(Semaphore::new(bound)));

        tracing::info!(
            retention_secs = config.retention_window_secs,
            max_concurrent_jobs = ?config.max_concurrent_jobs,
            "Download manager initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            registry,
            fetcher,
            notification_tx,
            event_tx,
            concurrency,
            accepting_new: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Subscribe to job notifications
    ///
    /// Multiple subscribers are supported; each receives every notification
    /// independently. Notifications are buffered, but a subscriber that falls
    /// behind by more than `notification_capacity` receives a
    /// `RecvError::Lagged` error on its next `recv`.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notification_tx.subscribe()
    }

    /// Look up the current status of a job
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the job was
    /// never submitted or its terminal record has been evicted after the
    /// retention window.
    pub async fn status(&self, id: JobId) -> Result<JobSnapshot> {
        self.registry.get(id).await
    }

    /// Number of jobs currently in `Running` state
    pub async fn running_jobs(&self) -> usize {
        self.registry.running_count().await
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Gracefully shut down the manager
    ///
    /// Stops accepting new submissions, then waits up to 30 seconds for
    /// running jobs to reach a terminal state. Jobs still running after the
    /// timeout are left to be torn down with the host process; cancellation
    /// is out of scope.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_running_jobs()).await {
            Ok(()) => tracing::info!("All jobs reached a terminal state"),
            Err(_) => tracing::warn!(
                "Timeout waiting for running jobs, proceeding with shutdown"
            ),
        }
    }

    /// Whether new submissions are currently accepted
    pub(crate) fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    async fn wait_for_running_jobs(&self) {
        loop {
            let running = self.registry.running_count().await;
            if running == 0 {
                return;
            }
            tracing::debug!(running, "Waiting for running jobs to finish");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
