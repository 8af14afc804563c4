use std::path::PathBuf;
use thiserror::Error;

use crate::recording::RecordingState;

/// Errors surfaced by the recording and upload core.
///
/// Collaborator failures arrive as `anyhow::Error` and are kept as the source
/// of the variant for the step that failed.
#[derive(Error, Debug)]
pub enum Error {
    /// Capture permission or hardware not granted, or the device refused a command.
    #[error("Capture device unavailable: {reason}")]
    DeviceUnavailable { reason: String },

    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: RecordingState,
        action: &'static str,
    },

    #[error("No active capture to stop")]
    NoActiveCapture,

    #[error("No authenticated uploader")]
    NotAuthenticated,

    #[error("Object store commit failed for '{key}': {source}")]
    ObjectStoreFailure {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Index record write failed: {source}")]
    IndexFailure {
        #[source]
        source: anyhow::Error,
    },

    /// Secondary hierarchical upload failed. Recorded on the job, never fatal.
    #[error("Hierarchical store commit failed: {source}")]
    HierarchyFailure {
        #[source]
        source: anyhow::Error,
    },

    #[error("A commit is already in flight for this session")]
    CommitInProgress,

    /// The commit task ended without a result (panicked or was cancelled).
    #[error("Commit task ended abnormally: {reason}")]
    CommitAborted { reason: String },

    #[error("Failed to resolve folder '{segment}': {source}")]
    FolderResolutionFailure {
        segment: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Local artifact '{path}': {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Network-class failures; the caller may retry the operation that failed.
    ///
    /// `commit` never returns `HierarchyFailure` (it is recorded as
    /// `HierarchyOutcome::Failed`); the variant only reaches callers that use a
    /// `HierarchyStore` directly.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ObjectStoreFailure { .. }
                | Error::IndexFailure { .. }
                | Error::FolderResolutionFailure { .. }
                | Error::HierarchyFailure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
