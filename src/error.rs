//! Error types for audio-dl
//!
//! The taxonomy separates the three failure scopes of the orchestrator:
//! - synchronous submission errors ([`Error::InvalidSource`]), raised before
//!   any worker is spawned
//! - item-local batch errors, which travel as `ItemError` notifications and
//!   never appear here
//! - whole-job failures, which reach subscribers as `JobError` notifications
//!   and the registry as a `Failed` status

use crate::types::JobId;
use thiserror::Error;

/// Result type alias for audio-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for audio-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Source descriptor rejected before any worker was spawned
    #[error("invalid source: {message}")]
    InvalidSource {
        /// Human-readable description of what is wrong with the descriptor
        message: String,
    },

    /// Job not found (never submitted, or evicted after its retention window)
    #[error("job {0} not found")]
    NotFound(JobId),

    /// Registry already holds a record with this ID
    #[error("job {0} already registered")]
    DuplicateJob(JobId),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "retention_window_secs")
        key: Option<String>,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_source_message_names_the_problem() {
        let err = Error::InvalidSource {
            message: "url must not be empty".into(),
        };
        assert_eq!(err.to_string(), "invalid source: url must not be empty");
    }

    #[test]
    fn not_found_includes_the_job_id() {
        let id = JobId::generate();
        let err = Error::NotFound(id);
        assert!(
            err.to_string().contains(&id.to_string()),
            "lookup errors must carry the id the caller asked about"
        );
    }

    #[test]
    fn config_error_displays_without_key() {
        let err = Error::Config {
            message: "retention window must be non-zero".into(),
            key: Some("retention_window_secs".into()),
        };
        assert_eq!(
            err.to_string(),
            "configuration error: retention window must be non-zero"
        );
    }
}
