//! # audio-dl
//!
//! Background download-job orchestrator for audio asset libraries.
//!
//! ## Design Philosophy
//!
//! audio-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Isolated** - Each fetch runs in its own task; a crash in one download
//!   never affects the dispatcher, sibling jobs, or the host process
//! - **Event-driven** - Consumers subscribe to notifications, no polling
//!   required
//! - **Pluggable** - All byte-level fetching lives behind the
//!   [`FetchRoutine`] trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use audio_dl::{
//!     BatchFetch, Config, DownloadManager, DownloadedFile, FetchError,
//!     FetchRoutine, SourceDescriptor, SourceKind,
//! };
//!
//! struct MyFetcher;
//!
//! #[async_trait::async_trait]
//! impl FetchRoutine for MyFetcher {
//!     async fn fetch_single(
//!         &self,
//!         source: &SourceDescriptor,
//!     ) -> Result<DownloadedFile, FetchError> {
//!         // ... download source.url into local storage ...
//!         Err(FetchError::new("not implemented"))
//!     }
//!
//!     async fn fetch_batch(
//!         &self,
//!         source: &SourceDescriptor,
//!     ) -> Result<BatchFetch, FetchError> {
//!         // ... expand the playlist and stream per-item outcomes ...
//!         Err(FetchError::new("not implemented"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = DownloadManager::new(Config::default(), Arc::new(MyFetcher))?;
//!
//!     // Subscribe to notifications
//!     let mut notifications = manager.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(notification) = notifications.recv().await {
//!             println!("{:?}", notification);
//!         }
//!     });
//!
//!     let job_id = manager
//!         .submit(SourceDescriptor {
//!             url: "https://host/track.mp3".into(),
//!             display_name: "Tavern ambience".into(),
//!             destination_folder_id: "folder-music".into(),
//!             kind: SourceKind::Single,
//!         })
//!         .await?;
//!
//!     println!("submitted {job_id}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Fetch routine boundary
pub mod fetch;
/// Core manager implementation (decomposed into focused submodules)
pub mod manager;
/// In-memory job registry
mod registry;
/// Core types and notifications
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use fetch::{BatchFetch, BatchItem, FetchError, FetchRoutine};
pub use manager::DownloadManager;
pub use types::{
    DownloadedFile, FetchedItem, JobId, JobSnapshot, JobStatus, Notification, NotificationKind,
    SourceDescriptor, SourceKind, WorkerMessage,
};
