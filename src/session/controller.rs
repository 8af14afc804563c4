use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{info, warn};

use super::snapshot::{SessionSnapshot, SessionState};
use crate::audio::{CaptureConfig, CaptureDevice};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::recording::{RecordingSession, RecordingState, StoppedCapture, Tick};
use crate::upload::{UploadJob, UploadMetadata, UploadOrchestrator, UploadReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Capture,
    Uploading,
    Terminal,
}

struct Inner {
    session: Option<RecordingSession>,
    stopped: Option<StoppedCapture>,
    phase: Phase,
    last_upload: Option<UploadReport>,
    last_error: Option<String>,
}

impl Inner {
    fn state(&self) -> SessionState {
        match self.phase {
            Phase::Uploading => SessionState::Uploading,
            Phase::Terminal => SessionState::Terminal,
            Phase::Capture => self
                .session
                .as_ref()
                .map(|s| s.state().into())
                .unwrap_or(SessionState::Idle),
        }
    }

    /// State machine view used in transition errors
    fn recording_state(&self) -> RecordingState {
        match self.phase {
            Phase::Capture => self
                .session
                .as_ref()
                .map(RecordingSession::state)
                .unwrap_or(RecordingState::Idle),
            Phase::Uploading => RecordingState::Stopped,
            Phase::Terminal => RecordingState::Idle,
        }
    }
}

/// Single-session front door for the presentation layer
///
/// Owns at most one recording session. State-mutating operations are
/// serialized; the commit itself runs without holding the lock so state can be
/// observed while uploading, and a second upload or a discard during it fails
/// with `CommitInProgress`.
pub struct SessionController {
    device: Arc<dyn CaptureDevice>,
    clock: Arc<dyn Clock>,
    capture_config: CaptureConfig,
    orchestrator: Arc<UploadOrchestrator>,
    shared: Arc<Shared>,
    ticks: broadcast::Sender<Tick>,
}

/// State reachable from the detached commit task
struct Shared {
    inner: Mutex<Inner>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        clock: Arc<dyn Clock>,
        capture_config: CaptureConfig,
        orchestrator: Arc<UploadOrchestrator>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::idle());
        let (ticks, _) = broadcast::channel(64);

        Self {
            device,
            clock,
            capture_config,
            orchestrator,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    session: None,
                    stopped: None,
                    phase: Phase::Capture,
                    last_upload: None,
                    last_error: None,
                }),
                snapshot_tx,
            }),
            ticks,
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.shared.snapshot_tx.borrow().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Change notifications; re-read the snapshot on each change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Elapsed-time samples emitted once per second while recording
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<Tick> {
        self.ticks.subscribe()
    }

    pub async fn elapsed_active(&self) -> Duration {
        let inner = self.shared.inner.lock().await;
        inner
            .session
            .as_ref()
            .map(RecordingSession::elapsed_active)
            .unwrap_or(Duration::ZERO)
    }

    pub async fn start(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;
        let phase = inner.phase;

        let result = match phase {
            Phase::Uploading => Err(Error::InvalidTransition {
                from: RecordingState::Stopped,
                action: "start",
            }),
            Phase::Terminal | Phase::Capture => {
                if phase == Phase::Terminal || inner.session.is_none() {
                    inner.session = Some(self.new_session());
                    inner.stopped = None;
                    inner.phase = Phase::Capture;
                }
                match inner.session.as_mut() {
                    Some(session) => session.start().await,
                    None => Err(Error::NoActiveCapture),
                }
            }
        };

        if result.is_ok() {
            inner.last_upload = None;
        }
        self.shared.finish(&mut inner, result)
    }

    pub async fn pause(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;
        let from = inner.recording_state();
        let result = match (inner.phase, inner.session.as_mut()) {
            (Phase::Capture, Some(session)) => session.pause().await,
            _ => Err(Error::InvalidTransition {
                from,
                action: "pause",
            }),
        };
        self.shared.finish(&mut inner, result)
    }

    pub async fn resume(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;
        let from = inner.recording_state();
        let result = match (inner.phase, inner.session.as_mut()) {
            (Phase::Capture, Some(session)) => session.resume().await,
            _ => Err(Error::InvalidTransition {
                from,
                action: "resume",
            }),
        };
        self.shared.finish(&mut inner, result)
    }

    pub async fn stop(&self) -> Result<StoppedCapture> {
        let mut inner = self.shared.inner.lock().await;
        let result = match (inner.phase, inner.session.as_mut()) {
            (Phase::Capture, Some(session)) => session.stop().await,
            _ => Err(Error::NoActiveCapture),
        };
        if let Ok(stopped) = &result {
            inner.stopped = Some(stopped.clone());
        }
        self.shared.finish(&mut inner, result)
    }

    /// Snapshot the labels into an upload job and commit it.
    ///
    /// The commit runs on its own task and settles the session state when it
    /// finishes, even if this future is dropped first. On failure the session
    /// returns to `Stopped` with the artifact intact.
    pub async fn begin_upload(&self, class_name: &str, topic: &str) -> Result<UploadReport> {
        let mut job = {
            let mut inner = self.shared.inner.lock().await;
            let job = match self.prepare_job(&inner, class_name, topic) {
                Ok(job) => job,
                Err(e) => return self.shared.finish(&mut inner, Err(e)),
            };
            inner.phase = Phase::Uploading;
            inner.last_error = None;
            self.shared.publish(&inner);
            job
        };

        info!(
            "Upload started for session {}: '{}'",
            job.session_id(),
            job.derived_name()
        );

        let orchestrator = Arc::clone(&self.orchestrator);
        let shared = Arc::clone(&self.shared);
        let commit = tokio::spawn(async move {
            let result = orchestrator.commit(&mut job).await;
            shared.settle_upload(result).await
        });

        match commit.await {
            Ok(result) => result,
            Err(e) => {
                let mut inner = self.shared.inner.lock().await;
                if inner.phase == Phase::Uploading {
                    inner.phase = Phase::Capture;
                }
                self.shared.finish(
                    &mut inner,
                    Err(Error::CommitAborted {
                        reason: e.to_string(),
                    }),
                )
            }
        }
    }

    /// Delete the stopped artifact without uploading
    pub async fn discard(&self) -> Result<()> {
        let mut inner = self.shared.inner.lock().await;

        let result = match (inner.phase, inner.stopped.as_ref()) {
            (Phase::Uploading, _) => Err(Error::CommitInProgress),
            (Phase::Capture, Some(stopped)) => {
                let path = stopped.artifact.clone();
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {
                        info!("Discarded session {} ({})", stopped.session_id, path.display());
                        Ok(())
                    }
                    Err(source) => Err(Error::Artifact { path, source }),
                }
            }
            _ => Err(Error::InvalidTransition {
                from: inner.recording_state(),
                action: "discard",
            }),
        };

        if result.is_ok() {
            inner.phase = Phase::Terminal;
            inner.stopped = None;
        }
        self.shared.finish(&mut inner, result)
    }

    fn prepare_job(&self, inner: &Inner, class_name: &str, topic: &str) -> Result<UploadJob> {
        if inner.phase == Phase::Uploading {
            return Err(Error::CommitInProgress);
        }
        let Some(stopped) = inner.stopped.as_ref().filter(|_| inner.phase == Phase::Capture) else {
            return Err(Error::InvalidTransition {
                from: inner.recording_state(),
                action: "upload",
            });
        };

        let metadata = UploadMetadata::new(class_name, topic, self.clock.now());
        Ok(UploadJob::new(
            stopped.session_id,
            stopped.artifact.clone(),
            metadata,
            self.capture_config.extension,
        ))
    }

    fn new_session(&self) -> RecordingSession {
        RecordingSession::new(
            Arc::clone(&self.device),
            Arc::clone(&self.clock),
            self.capture_config.clone(),
            self.ticks.clone(),
        )
    }
}

impl Shared {
    /// Record the commit outcome; failures leave the artifact for retry or discard
    async fn settle_upload(&self, result: Result<UploadReport>) -> Result<UploadReport> {
        let mut inner = self.inner.lock().await;
        match &result {
            Ok(report) => {
                inner.phase = Phase::Terminal;
                inner.stopped = None;
                inner.last_upload = Some(report.clone());
            }
            Err(_) => {
                inner.phase = Phase::Capture;
            }
        }
        self.finish(&mut inner, result)
    }

    fn finish<T>(&self, inner: &mut Inner, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => inner.last_error = None,
            Err(e) => {
                warn!("Session operation failed: {}", e);
                inner.last_error = Some(e.to_string());
            }
        }
        self.publish(inner);
        result
    }

    fn publish(&self, inner: &Inner) {
        let snapshot = SessionSnapshot {
            session_id: inner.session.as_ref().map(RecordingSession::id),
            state: inner.state(),
            elapsed_secs: inner
                .session
                .as_ref()
                .map(|s| s.elapsed_active().as_secs_f64())
                .unwrap_or(0.0),
            artifact: inner.stopped.as_ref().map(|s| s.artifact.clone()),
            last_upload: inner.last_upload.clone(),
            last_error: inner.last_error.clone(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}
