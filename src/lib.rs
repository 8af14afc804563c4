pub mod audio;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod naming;
pub mod recording;
pub mod session;
pub mod storage;
pub mod upload;

pub use audio::{CaptureConfig, CaptureDevice, CaptureHandle, CapturedAudio, FileCaptureDevice};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use http::{create_router, AppState};
pub use recording::{RecordingSession, RecordingState, SessionTiming, StoppedCapture, Tick};
pub use session::{SessionController, SessionSnapshot, SessionState};
pub use storage::{
    ArtifactBody, FileId, FolderId, HierarchyStore, IdentityProvider, IndexRecord, IndexStore,
    ObjectStore, RecordId, RetrievalRef, Uploader,
};
pub use upload::{
    FolderPath, FolderResolver, HierarchyOutcome, JobStatus, OrchestratorConfig, UploadJob,
    UploadMetadata, UploadOrchestrator, UploadReport,
};
