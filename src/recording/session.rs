use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use super::state::{lock_timing, RecordingState, SessionTiming};
use super::ticker::{ElapsedTicker, Tick, TICK_PERIOD};
use crate::audio::{CaptureConfig, CaptureDevice, CaptureHandle};
use crate::clock::Clock;
use crate::error::{Error, Result};

/// Result of a successful stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedCapture {
    pub session_id: Uuid,
    /// Finished local artifact
    pub artifact: PathBuf,
    /// Active time measured by the session clock
    pub elapsed_active: Duration,
    /// Duration reported by the capture device
    pub device_duration: Duration,
}

/// Recording session state machine
///
/// Owns the capture handle, the timing fields and the elapsed ticker. The
/// ticker runs exactly while the state is `Recording`.
pub struct RecordingSession {
    id: Uuid,
    device: Arc<dyn CaptureDevice>,
    clock: Arc<dyn Clock>,
    capture_config: CaptureConfig,
    timing: Arc<Mutex<SessionTiming>>,
    handle: Option<CaptureHandle>,
    artifact: Option<PathBuf>,
    ticker: Option<ElapsedTicker>,
    ticks: broadcast::Sender<Tick>,
    tick_period: Duration,
}

impl RecordingSession {
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        clock: Arc<dyn Clock>,
        capture_config: CaptureConfig,
        ticks: broadcast::Sender<Tick>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            device,
            clock,
            capture_config,
            timing: Arc::new(Mutex::new(SessionTiming::new())),
            handle: None,
            artifact: None,
            ticker: None,
            ticks,
            tick_period: TICK_PERIOD,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RecordingState {
        lock_timing(&self.timing).state
    }

    pub fn timing(&self) -> SessionTiming {
        lock_timing(&self.timing).clone()
    }

    pub fn elapsed_active(&self) -> Duration {
        lock_timing(&self.timing).elapsed_active(self.clock.now())
    }

    /// Local artifact, set once stopped
    pub fn artifact(&self) -> Option<&Path> {
        self.artifact.as_deref()
    }

    pub fn capture_config(&self) -> &CaptureConfig {
        &self.capture_config
    }

    /// Whether the display ticker is currently scheduled
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub async fn start(&mut self) -> Result<()> {
        self.expect_state(&[RecordingState::Idle], "start")?;

        if !self.device.has_permission().await {
            warn!("Recording permission not granted ({})", self.device.name());
            return Err(Error::DeviceUnavailable {
                reason: "recording permission not granted".to_string(),
            });
        }

        let handle = self
            .device
            .start(&self.capture_config)
            .await
            .map_err(|e| Error::DeviceUnavailable {
                reason: format!("{:#}", e),
            })?;
        self.handle = Some(handle);

        {
            let mut timing = lock_timing(&self.timing);
            timing.begin(self.clock.now());
        }
        self.spawn_ticker();

        info!("Recording session {} started ({})", self.id, self.device.name());
        Ok(())
    }

    pub async fn pause(&mut self) -> Result<()> {
        self.expect_state(&[RecordingState::Recording], "pause")?;
        let handle = self.handle.ok_or(Error::NoActiveCapture)?;

        self.device
            .pause(handle)
            .await
            .map_err(|e| Error::DeviceUnavailable {
                reason: format!("{:#}", e),
            })?;

        {
            let mut timing = lock_timing(&self.timing);
            timing.pause(self.clock.now());
        }
        self.cancel_ticker();

        info!("Recording session {} paused", self.id);
        Ok(())
    }

    pub async fn resume(&mut self) -> Result<()> {
        self.expect_state(&[RecordingState::Paused], "resume")?;
        let handle = self.handle.ok_or(Error::NoActiveCapture)?;

        self.device
            .resume(handle)
            .await
            .map_err(|e| Error::DeviceUnavailable {
                reason: format!("{:#}", e),
            })?;

        {
            let mut timing = lock_timing(&self.timing);
            timing.resume(self.clock.now());
        }
        self.spawn_ticker();

        info!("Recording session {} resumed", self.id);
        Ok(())
    }

    /// Finalize the capture. The state is unchanged if the device fails.
    pub async fn stop(&mut self) -> Result<StoppedCapture> {
        let state = self.state();
        if !matches!(state, RecordingState::Recording | RecordingState::Paused) {
            return Err(Error::NoActiveCapture);
        }
        let handle = self.handle.ok_or(Error::NoActiveCapture)?;

        let captured = self
            .device
            .stop(handle)
            .await
            .map_err(|e| Error::DeviceUnavailable {
                reason: format!("{:#}", e),
            })?;

        let elapsed_active = {
            let mut timing = lock_timing(&self.timing);
            let now = self.clock.now();
            timing.stop(now);
            timing.elapsed_active(now)
        };
        self.cancel_ticker();
        self.handle = None;
        self.artifact = Some(captured.path.clone());

        info!(
            "Recording session {} stopped: {:.1}s active, artifact {}",
            self.id,
            elapsed_active.as_secs_f64(),
            captured.path.display()
        );

        Ok(StoppedCapture {
            session_id: self.id,
            artifact: captured.path,
            elapsed_active,
            device_duration: captured.duration,
        })
    }

    fn expect_state(&self, allowed: &[RecordingState], action: &'static str) -> Result<()> {
        let from = self.state();
        if allowed.contains(&from) {
            Ok(())
        } else {
            Err(Error::InvalidTransition { from, action })
        }
    }

    fn spawn_ticker(&mut self) {
        self.cancel_ticker();
        self.ticker = Some(ElapsedTicker::spawn(
            self.id,
            Arc::clone(&self.timing),
            Arc::clone(&self.clock),
            self.ticks.clone(),
            self.tick_period,
        ));
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}
