//! Fetch routine boundary
//!
//! All byte-level fetching and media extraction lives behind the
//! [`FetchRoutine`] trait. The orchestrator treats it as a black box with one
//! contract: a single fetch resolves to exactly one file or a fatal error,
//! and a batch fetch resolves to a declared item count plus a stream of
//! per-item outcomes (or a fatal error before the first item).
//!
//! Implementations may block on network I/O freely; they always run inside a
//! worker task, never on the submission path.

use crate::types::{DownloadedFile, FetchedItem, SourceDescriptor};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Error returned by a fetch routine
///
/// Opaque to the orchestrator: it only ever travels onward as notification
/// text. Implementations put whatever diagnostic detail they have into the
/// message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct FetchError(String);

impl FetchError {
    /// Create a fetch error from any displayable cause
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Outcome of one item within a batch fetch
#[derive(Debug)]
pub enum BatchItem {
    /// The item downloaded successfully
    Fetched {
        /// Item metadata and resulting file
        item: FetchedItem,
    },

    /// The item failed; the batch continues
    Failed {
        /// Error text for this item
        error: String,
        /// Item title (if known)
        title: Option<String>,
        /// Item URL (if known)
        url: Option<String>,
    },
}

/// An expanded batch source: declared shape plus a stream of item outcomes
pub struct BatchFetch {
    /// Number of items the source declares
    pub total: u32,

    /// Estimated total size in bytes (if the source reports one)
    pub estimated_size_bytes: Option<u64>,

    /// Per-item outcomes, yielded in source order
    pub items: BoxStream<'static, BatchItem>,
}

impl std::fmt::Debug for BatchFetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchFetch")
            .field("total", &self.total)
            .field("estimated_size_bytes", &self.estimated_size_bytes)
            .finish_non_exhaustive()
    }
}

/// External collaborator that performs the actual download work
///
/// One implementation is injected at manager construction and shared by all
/// workers. The worker picks the method from the source kind: playlist
/// sources go through [`fetch_batch`](FetchRoutine::fetch_batch), everything
/// else through [`fetch_single`](FetchRoutine::fetch_single).
#[async_trait]
pub trait FetchRoutine: Send + Sync {
    /// Fetch a single-file or extractable-stream source into local storage
    async fn fetch_single(
        &self,
        source: &SourceDescriptor,
    ) -> std::result::Result<DownloadedFile, FetchError>;

    /// Expand a batch source and fetch its items
    ///
    /// A returned `Err` is fatal for the whole job. Once a [`BatchFetch`] is
    /// returned, per-item failures are reported through the stream and never
    /// fail the job.
    async fn fetch_batch(
        &self,
        source: &SourceDescriptor,
    ) -> std::result::Result<BatchFetch, FetchError>;
}
