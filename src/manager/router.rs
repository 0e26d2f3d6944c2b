//! Event router - consumes worker messages, updates the registry, and
//! publishes notifications.
//!
//! One router task per manager owns every job mutation after submission.
//! Messages arrive over a single mpsc channel, so per-worker emission order
//! is preserved (FIFO per job); eviction of terminal records is driven by a
//! [`DelayQueue`] inside the same task, keeping the single-writer model
//! intact.

use chrono::Utc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::time::DelayQueue;

use crate::registry::JobRegistry;
use crate::types::{JobId, JobStatus, Notification, NotificationKind, SourceKind, WorkerMessage};

/// Event consumed by the router task
pub(crate) enum RouterEvent {
    /// Protocol message from a worker
    Message {
        job_id: JobId,
        message: WorkerMessage,
    },
    /// Abnormal worker termination observed by the monitor
    Fault { job_id: JobId, error: String },
}

/// Router state: registry writer and notification publisher
pub(crate) struct EventRouter {
    registry: JobRegistry,
    notifications: broadcast::Sender<Notification>,
    retention: Duration,
}

impl EventRouter {
    pub(crate) fn new(
        registry: JobRegistry,
        notifications: broadcast::Sender<Notification>,
        retention: Duration,
    ) -> Self {
        Self {
            registry,
            notifications,
            retention,
        }
    }

    /// Spawn the router loop; it stops once every event sender is dropped
    pub(crate) fn spawn(self, event_rx: mpsc::Receiver<RouterEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(event_rx))
    }

    async fn run(self, mut event_rx: mpsc::Receiver<RouterEvent>) {
        let mut evictions: DelayQueue<JobId> = DelayQueue::new();

        loop {
            tokio::select! {
                event = event_rx.recv() => match event {
                    Some(event) => self.handle_event(event, &mut evictions).await,
                    None => break,
                },
                expired = futures::future::poll_fn(|cx| evictions.poll_expired(cx)),
                    if !evictions.is_empty() =>
                {
                    if let Some(expired) = expired {
                        self.evict(expired.into_inner()).await;
                    }
                }
            }
        }

        tracing::debug!("Event router stopped");
    }

    async fn handle_event(&self, event: RouterEvent, evictions: &mut DelayQueue<JobId>) {
        match event {
            RouterEvent::Message { job_id, message } => {
                self.on_message(job_id, message, evictions).await;
            }
            RouterEvent::Fault { job_id, error } => {
                self.on_worker_fault(job_id, error, evictions).await;
            }
        }
    }

    async fn on_message(
        &self,
        job_id: JobId,
        message: WorkerMessage,
        evictions: &mut DelayQueue<JobId>,
    ) {
        match message {
            WorkerMessage::Progress { item, index, total } => {
                self.publish_running(job_id, NotificationKind::Progress { item, index, total })
                    .await;
            }
            WorkerMessage::Metadata {
                total,
                estimated_size_bytes,
            } => {
                self.publish_running(
                    job_id,
                    NotificationKind::Metadata {
                        total,
                        estimated_size_bytes,
                    },
                )
                .await;
            }
            WorkerMessage::ItemError {
                index,
                total,
                error,
                title,
                url,
            } => {
                // Partial-failure isolation: the job stays Running.
                self.publish_running(
                    job_id,
                    NotificationKind::ItemError {
                        index,
                        total,
                        error,
                        title,
                        url,
                    },
                )
                .await;
            }
            WorkerMessage::Complete { file } => {
                self.finish_job(
                    job_id,
                    JobStatus::Completed,
                    None,
                    NotificationKind::Complete { file },
                    evictions,
                )
                .await;
            }
            WorkerMessage::WorkerError { error } => {
                self.finish_job(
                    job_id,
                    JobStatus::Failed,
                    Some(error.clone()),
                    NotificationKind::JobError { error },
                    evictions,
                )
                .await;
            }
        }
    }

    /// Handle abnormal worker termination reported by the monitor
    ///
    /// Idempotent: a no-op if the job is already terminal, which guards
    /// against double-fault signals (an explicit error message followed by
    /// the monitor's exit report).
    async fn on_worker_fault(
        &self,
        job_id: JobId,
        error: String,
        evictions: &mut DelayQueue<JobId>,
    ) {
        let already_terminal = self
            .registry
            .with_mut(job_id, |job| job.status.is_terminal())
            .await;

        match already_terminal {
            None => {
                tracing::debug!(job_id = %job_id, "Fault for unknown job, ignoring");
            }
            Some(true) => {
                tracing::debug!(job_id = %job_id, "Fault after terminal state, ignoring");
            }
            Some(false) => {
                tracing::warn!(job_id = %job_id, error = %error, "Worker fault");
                self.finish_job(
                    job_id,
                    JobStatus::Failed,
                    Some(error.clone()),
                    NotificationKind::JobError { error },
                    evictions,
                )
                .await;
            }
        }
    }

    /// Publish a non-terminal notification; the job stays `Running`
    async fn publish_running(&self, job_id: JobId, kind: NotificationKind) {
        match self.download_type_of_running(job_id).await {
            Some(download_type) => self.publish(job_id, download_type, kind),
            None => {
                tracing::debug!(job_id = %job_id, "Message for unknown or terminal job, dropping");
            }
        }
    }

    /// Transition a job to a terminal status, release its worker handle, and
    /// publish the terminal notification
    ///
    /// At most one terminal transition per job: a second terminal message is
    /// dropped without publishing.
    async fn finish_job(
        &self,
        job_id: JobId,
        status: JobStatus,
        error: Option<String>,
        kind: NotificationKind,
        evictions: &mut DelayQueue<JobId>,
    ) {
        let transitioned = self
            .registry
            .with_mut(job_id, |job| {
                if job.status.is_terminal() {
                    return None;
                }
                job.status = status;
                job.error = error;
                // Release the worker handle; the task is done or about to be.
                job.worker.take();
                Some(job.source.kind)
            })
            .await
            .flatten();

        let Some(download_type) = transitioned else {
            tracing::debug!(job_id = %job_id, ?status, "Duplicate terminal message, dropping");
            return;
        };

        match status {
            JobStatus::Failed => {
                tracing::warn!(job_id = %job_id, "Job failed");
            }
            _ => {
                tracing::info!(job_id = %job_id, "Job completed");
            }
        }

        self.publish(job_id, download_type, kind);
        evictions.insert(job_id, self.retention);
    }

    /// Evict a terminal job record after its retention window
    async fn evict(&self, job_id: JobId) {
        if self.registry.remove(job_id).await {
            tracing::debug!(job_id = %job_id, "Evicted terminal job record");
        }
    }

    async fn download_type_of_running(&self, job_id: JobId) -> Option<SourceKind> {
        self.registry
            .with_mut(job_id, |job| {
                if job.status.is_terminal() {
                    None
                } else {
                    Some(job.source.kind)
                }
            })
            .await
            .flatten()
    }

    fn publish(&self, job_id: JobId, download_type: SourceKind, kind: NotificationKind) {
        let notification = Notification {
            job_id,
            timestamp: Utc::now(),
            download_type,
            kind,
        };
        // send() fails only when nobody is subscribed, which is fine.
        self.notifications.send(notification).ok();
    }
}
