//! Configuration types for audio-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for [`DownloadManager`](crate::DownloadManager)
///
/// All fields have sensible defaults; `Config::default()` works out of the
/// box. Values are validated once at manager construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// How long terminal job records are retained before eviction, in seconds
    /// (default: 3600)
    ///
    /// After a job reaches `Completed` or `Failed` its record stays available
    /// for status lookups for this window, then is evicted to bound memory.
    /// Lookups on an evicted job return `NotFound`.
    #[serde(default = "default_retention_window_secs")]
    pub retention_window_secs: u64,

    /// Buffer size of the notification broadcast channel (default: 1000)
    ///
    /// A subscriber that falls behind by more than this many notifications
    /// receives a `Lagged` error from its receiver.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,

    /// Buffer size of the worker-to-router message channel (default: 256)
    #[serde(default = "default_message_capacity")]
    pub message_capacity: usize,

    /// Maximum number of jobs fetching concurrently (None = unbounded)
    ///
    /// When set, workers beyond the bound wait for a permit inside their own
    /// task; `submit` still returns immediately and the job counts as
    /// `Running` while it waits.
    #[serde(default)]
    pub max_concurrent_jobs: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retention_window_secs: default_retention_window_secs(),
            notification_capacity: default_notification_capacity(),
            message_capacity: default_message_capacity(),
            max_concurrent_jobs: None,
        }
    }
}

impl Config {
    /// Retention window as a [`Duration`]
    pub fn retention_window(&self) -> Duration {
        Duration::from_secs(self.retention_window_secs)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key if any value is
    /// out of range.
    pub fn validate(&self) -> Result<()> {
        if self.retention_window_secs == 0 {
            return Err(Error::Config {
                message: "retention window must be non-zero".into(),
                key: Some("retention_window_secs".into()),
            });
        }
        if self.notification_capacity == 0 {
            return Err(Error::Config {
                message: "notification channel capacity must be non-zero".into(),
                key: Some("notification_capacity".into()),
            });
        }
        if self.message_capacity == 0 {
            return Err(Error::Config {
                message: "message channel capacity must be non-zero".into(),
                key: Some("message_capacity".into()),
            });
        }
        if self.max_concurrent_jobs == Some(0) {
            return Err(Error::Config {
                message: "concurrency bound must be at least 1 when set".into(),
                key: Some("max_concurrent_jobs".into()),
            });
        }
        Ok(())
    }
}

fn default_retention_window_secs() -> u64 {
    3600
}

fn default_notification_capacity() -> usize {
    1000
}

fn default_message_capacity() -> usize {
    256
}
