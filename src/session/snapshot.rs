use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::recording::RecordingState;
use crate::upload::UploadReport;

/// Session state as rendered by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Recording,
    Paused,
    Stopped,
    Uploading,
    /// Uploaded or discarded; the next start begins a new session
    Terminal,
}

impl From<RecordingState> for SessionState {
    fn from(state: RecordingState) -> Self {
        match state {
            RecordingState::Idle => SessionState::Idle,
            RecordingState::Recording => SessionState::Recording,
            RecordingState::Paused => SessionState::Paused,
            RecordingState::Stopped => SessionState::Stopped,
        }
    }
}

/// Read-only view published after every transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub state: SessionState,
    /// Active time at the moment of the snapshot
    pub elapsed_secs: f64,
    /// Local artifact awaiting upload or discard
    pub artifact: Option<PathBuf>,
    pub last_upload: Option<UploadReport>,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        Self {
            session_id: None,
            state: SessionState::Idle,
            elapsed_secs: 0.0,
            artifact: None,
            last_upload: None,
            last_error: None,
        }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}
