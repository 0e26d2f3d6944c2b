//! Core types for audio-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a download job
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Generate a new collision-resistant job ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for JobId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<JobId> for Uuid {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Job status
///
/// Transitions only move forward: `Running` to exactly one of `Completed` or
/// `Failed`. A terminal status is never left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Worker is active (or waiting for a concurrency permit)
    Running,
    /// Terminal: the job finished successfully
    Completed,
    /// Terminal: the job failed as a whole
    Failed,
}

impl JobStatus {
    /// Whether this status is terminal (`Completed` or `Failed`)
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Kind of remote source a job fetches from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Direct link to a single audio file
    Single,
    /// Link that requires media extraction to yield one audio stream
    Stream,
    /// Source that expands into multiple downloadable items
    Playlist,
}

impl SourceKind {
    /// Whether this source expands into multiple items
    pub fn is_batch(&self) -> bool {
        matches!(self, SourceKind::Playlist)
    }
}

/// Specification of what to fetch and where to store it
///
/// Immutable once a job starts; the dispatcher validates the URL before any
/// worker is spawned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Remote URL of the source
    pub url: String,

    /// Human-readable name shown to observers
    pub display_name: String,

    /// Identifier of the destination folder in the host application
    pub destination_folder_id: String,

    /// Kind of source (single file, extractable stream, or playlist)
    pub kind: SourceKind,
}

/// A file produced by a completed fetch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedFile {
    /// Final file name
    pub name: String,

    /// Path of the file in local storage
    pub path: PathBuf,

    /// File size in bytes (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// MIME type (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// One successfully fetched item within a batch source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedItem {
    /// Item title (if the source provides one)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Item URL within the batch source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Resulting file (if the fetch routine materialized one)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<DownloadedFile>,
}

/// Message emitted by a worker for its job
///
/// Exactly one worker emits for a given job. `Complete` and `WorkerError`
/// are terminal: a well-behaved worker sends exactly one of them, last.
#[derive(Clone, Debug)]
pub enum WorkerMessage {
    /// One batch item finished downloading
    Progress {
        /// The item that finished
        item: FetchedItem,
        /// 1-based position within the batch; strictly increasing per job
        index: u32,
        /// Declared item count of the batch
        total: u32,
    },

    /// Batch shape discovered (informational, no status change)
    Metadata {
        /// Declared item count of the batch
        total: u32,
        /// Estimated total size in bytes (if the source reports one)
        estimated_size_bytes: Option<u64>,
    },

    /// One batch item failed; the batch continues
    ItemError {
        /// 1-based position of the failed item
        index: u32,
        /// Declared item count of the batch
        total: u32,
        /// Error text for the failed item
        error: String,
        /// Item title (if known)
        title: Option<String>,
        /// Item URL (if known)
        url: Option<String>,
    },

    /// Terminal: the job finished successfully
    Complete {
        /// Resulting file; `None` on the batch path
        file: Option<DownloadedFile>,
    },

    /// Terminal: the whole job failed
    WorkerError {
        /// Error text describing the failure
        error: String,
    },
}

impl WorkerMessage {
    /// Whether this message ends the job (`Complete` or `WorkerError`)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerMessage::Complete { .. } | WorkerMessage::WorkerError { .. }
        )
    }
}

/// Externally visible projection of a worker message
///
/// Exactly one notification is published per message received from a worker,
/// annotated with the job ID and a timestamp. De-duplication and persistence
/// are the subscriber's responsibility.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    /// Job this notification belongs to
    pub job_id: JobId,

    /// When the router processed the underlying message
    pub timestamp: DateTime<Utc>,

    /// Kind of source the job fetches from
    pub download_type: SourceKind,

    /// Kind-specific payload
    #[serde(flatten)]
    pub kind: NotificationKind,
}

/// Kind-specific notification payload
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    /// One batch item finished downloading
    Progress {
        /// The item that finished
        item: FetchedItem,
        /// 1-based position within the batch
        index: u32,
        /// Declared item count of the batch
        total: u32,
    },

    /// Batch shape discovered
    Metadata {
        /// Declared item count of the batch
        total: u32,
        /// Estimated total size in bytes (if known)
        #[serde(skip_serializing_if = "Option::is_none")]
        estimated_size_bytes: Option<u64>,
    },

    /// One batch item failed; the job is still running
    ItemError {
        /// 1-based position of the failed item
        index: u32,
        /// Declared item count of the batch
        total: u32,
        /// Error text for the failed item
        error: String,
        /// Item title (if known)
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Item URL (if known)
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },

    /// The job completed successfully
    Complete {
        /// Resulting file; absent on the batch path
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<DownloadedFile>,
    },

    /// The job failed as a whole
    JobError {
        /// Error text describing the failure
        error: String,
    },
}

impl NotificationKind {
    /// Whether this notification reports a terminal outcome
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NotificationKind::Complete { .. } | NotificationKind::JobError { .. }
        )
    }
}

/// Point-in-time view of a job record
///
/// Returned by status lookups; the live record (including the worker handle)
/// never leaves the registry.
#[derive(Clone, Debug)]
pub struct JobSnapshot {
    /// Job identifier
    pub id: JobId,

    /// Source the job was submitted with
    pub source: SourceDescriptor,

    /// Current status
    pub status: JobStatus,

    /// Terminal error text (set only when status is `Failed`)
    pub error: Option<String>,

    /// When the job was submitted
    pub created_at: DateTime<Utc>,
}
