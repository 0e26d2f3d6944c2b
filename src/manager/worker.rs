//! Worker execution and termination monitoring.
//!
//! One worker task per job, fed a fixed `(SourceDescriptor, JobId)` input at
//! creation and communicating only outward through the router channel. The
//! worker's single decision point is the source kind: playlist sources run
//! the batch path, everything else a single fetch. All actual I/O is
//! delegated to the injected [`FetchRoutine`].

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;

use crate::fetch::{BatchItem, FetchRoutine};
use crate::types::{JobId, SourceDescriptor, WorkerMessage};

use super::router::RouterEvent;

/// Fixed input handed to a worker at creation
pub(crate) struct WorkerContext {
    pub(crate) job_id: JobId,
    pub(crate) source: SourceDescriptor,
    pub(crate) fetcher: Arc<dyn FetchRoutine>,
    pub(crate) events: mpsc::Sender<RouterEvent>,
    pub(crate) permits: Option<Arc<Semaphore>>,
}

impl WorkerContext {
    async fn send(&self, message: WorkerMessage) {
        // The router only goes away when the whole manager is dropped, at
        // which point there is nobody left to notify.
        if self
            .events
            .send(RouterEvent::Message {
                job_id: self.job_id,
                message,
            })
            .await
            .is_err()
        {
            tracing::debug!(job_id = %self.job_id, "Router gone, dropping worker message");
        }
    }
}

/// Run the fetch for one job, emitting protocol messages as it goes
///
/// Emits zero or more non-terminal messages followed by exactly one terminal
/// message (`Complete` or `WorkerError`). Panics and silent exits are caught
/// by the termination monitor instead.
pub(crate) async fn run_worker(ctx: WorkerContext) {
    let _permit = match &ctx.permits {
        Some(semaphore) => match Arc::clone(semaphore).acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => {
                ctx.send(WorkerMessage::WorkerError {
                    error: "concurrency limiter closed before the job could start".into(),
                })
                .await;
                return;
            }
        },
        None => None,
    };

    if ctx.source.kind.is_batch() {
        run_batch(&ctx).await;
    } else {
        run_single(&ctx).await;
    }
}

async fn run_single(ctx: &WorkerContext) {
    match ctx.fetcher.fetch_single(&ctx.source).await {
        Ok(file) => {
            tracing::debug!(job_id = %ctx.job_id, file = %file.name, "Single fetch finished");
            ctx.send(WorkerMessage::Complete { file: Some(file) }).await;
        }
        Err(e) => {
            tracing::warn!(job_id = %ctx.job_id, error = %e, "Single fetch failed");
            ctx.send(WorkerMessage::WorkerError {
                error: e.to_string(),
            })
            .await;
        }
    }
}

async fn run_batch(ctx: &WorkerContext) {
    let batch = match ctx.fetcher.fetch_batch(&ctx.source).await {
        Ok(batch) => batch,
        Err(e) => {
            tracing::warn!(job_id = %ctx.job_id, error = %e, "Batch expansion failed");
            ctx.send(WorkerMessage::WorkerError {
                error: e.to_string(),
            })
            .await;
            return;
        }
    };

    let total = batch.total;
    ctx.send(WorkerMessage::Metadata {
        total,
        estimated_size_bytes: batch.estimated_size_bytes,
    })
    .await;

    let mut items = batch.items;
    let mut index = 0u32;
    while let Some(outcome) = items.next().await {
        index += 1;
        match outcome {
            BatchItem::Fetched { item } => {
                ctx.send(WorkerMessage::Progress { item, index, total }).await;
            }
            BatchItem::Failed { error, title, url } => {
                // One failed item never fails the batch.
                tracing::debug!(
                    job_id = %ctx.job_id,
                    index,
                    error = %error,
                    "Batch item failed"
                );
                ctx.send(WorkerMessage::ItemError {
                    index,
                    total,
                    error,
                    title,
                    url,
                })
                .await;
            }
        }
    }

    tracing::debug!(job_id = %ctx.job_id, items = index, "Batch finished");
    ctx.send(WorkerMessage::Complete { file: None }).await;
}

/// Watch a worker's join handle and report its termination to the router
///
/// Always sends a fault once the worker is gone. For workers that already
/// emitted a terminal message the router treats the fault as a no-op; for
/// workers that panicked or exited silently it becomes the synthesized
/// `WorkerError` that guarantees every job terminates observably.
pub(crate) fn spawn_termination_monitor(
    job_id: JobId,
    handle: JoinHandle<()>,
    events: mpsc::Sender<RouterEvent>,
) {
    tokio::spawn(async move {
        let error = match handle.await {
            Ok(()) => "worker terminated unexpectedly without a terminal message".to_string(),
            Err(join_err) if join_err.is_panic() => {
                let payload = join_err.into_panic();
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                format!("worker panicked: {detail}")
            }
            Err(_) => "worker task was cancelled".to_string(),
        };

        if events
            .send(RouterEvent::Fault { job_id, error })
            .await
            .is_err()
        {
            tracing::debug!(job_id = %job_id, "Router gone, dropping worker fault");
        }
    });
}
