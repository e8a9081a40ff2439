//! Error types crossing the public boundary.
//!
//! Transient, bounded conditions (missed frames, a worker outliving its
//! join timeout, a degenerate crop window) are absorbed where they occur
//! and logged; only conditions that affect the caller's ability to trust
//! the result are returned as values.

use thiserror::Error;

use crate::capture::SessionState;

/// Errors returned by [`crate::capture::RecordingSession`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The capture device or video sink could not be opened. Whatever was
    /// partially acquired has already been released.
    #[error("failed to acquire recording resources: {0:#}")]
    ResourceUnavailable(anyhow::Error),

    /// The operation is not valid in the session's current state. No side
    /// effects occurred.
    #[error("{op} is not valid while the session is {state:?}")]
    InvalidStateTransition {
        op: &'static str,
        state: SessionState,
    },

    /// The event log could not be written at stop. The session has still
    /// been reset to idle; the in-memory log is lost.
    #[error("failed to persist event metadata")]
    PersistenceFailure(#[from] PersistError),
}

/// Errors from reading or writing the event metadata file.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("event log encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
