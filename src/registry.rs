//! In-memory job registry
//!
//! Process-wide shared state with a single-owner mutation policy: the
//! dispatcher inserts a record at submission, and from then on every mutation
//! flows through the event router task. Readers only ever see
//! [`JobSnapshot`] projections; the live record (with its worker handle)
//! never leaves this module.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::AbortHandle;

use crate::error::{Error, Result};
use crate::types::{JobId, JobSnapshot, JobStatus, SourceDescriptor};

/// One tracked download job
#[derive(Debug)]
pub(crate) struct Job {
    /// Job identifier (duplicated from the registry key for snapshots)
    pub(crate) id: JobId,
    /// Source the job was submitted with (immutable once the worker starts)
    pub(crate) source: SourceDescriptor,
    /// Current status
    pub(crate) status: JobStatus,
    /// Handle to the worker task; released on terminal transition
    pub(crate) worker: Option<AbortHandle>,
    /// Terminal error text (set only when status is `Failed`)
    pub(crate) error: Option<String>,
    /// When the job was submitted
    pub(crate) created_at: DateTime<Utc>,
}

impl Job {
    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            source: self.source.clone(),
            status: self.status,
            error: self.error.clone(),
            created_at: self.created_at,
        }
    }
}

/// Registry of all known jobs, keyed by [`JobId`]
///
/// Cloneable; all clones share the same map. Average O(1) insert, lookup,
/// and removal.
#[derive(Clone, Default)]
pub(crate) struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl JobRegistry {
    /// Create an empty registry
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created job record
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateJob`] if a record with the same ID already
    /// exists; the registry never holds two records with one ID.
    pub(crate) async fn insert(&self, job: Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        match jobs.entry(job.id) {
            std::collections::hash_map::Entry::Occupied(_) => Err(Error::DuplicateJob(job.id)),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(job);
                Ok(())
            }
        }
    }

    /// Look up a job and return a point-in-time snapshot
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the job was never submitted or has
    /// been evicted after its retention window.
    pub(crate) async fn get(&self, id: JobId) -> Result<JobSnapshot> {
        let jobs = self.jobs.read().await;
        jobs.get(&id)
            .map(Job::snapshot)
            .ok_or(Error::NotFound(id))
    }

    /// Mutate a job record in place, returning the closure's result
    ///
    /// Returns `None` if the job is not in the registry. Only the event
    /// router calls this after insertion.
    pub(crate) async fn with_mut<T>(
        &self,
        id: JobId,
        f: impl FnOnce(&mut Job) -> T,
    ) -> Option<T> {
        let mut jobs = self.jobs.write().await;
        jobs.get_mut(&id).map(f)
    }

    /// Remove a job record, returning whether one was present
    pub(crate) async fn remove(&self, id: JobId) -> bool {
        let mut jobs = self.jobs.write().await;
        jobs.remove(&id).is_some()
    }

    /// Number of jobs currently in `Running` state
    pub(crate) async fn running_count(&self) -> usize {
        let jobs = self.jobs.read().await;
        jobs.values()
            .filter(|job| job.status == JobStatus::Running)
            .count()
    }
}
