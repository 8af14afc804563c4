use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use super::backend::{CaptureConfig, CaptureDevice, CaptureHandle, CapturedAudio};

/// Capture device that replays a pre-recorded file (for testing/batch processing)
///
/// On stop the source is copied into the recordings directory as
/// `recording_<epoch-millis>.<ext>`. The reported duration is the active
/// wall-clock time between start and stop.
pub struct FileCaptureDevice {
    source: PathBuf,
    recordings_dir: PathBuf,
    captures: Mutex<HashMap<CaptureHandle, FileCapture>>,
}

struct FileCapture {
    output: PathBuf,
    active: Duration,
    running_since: Option<Instant>,
}

impl FileCaptureDevice {
    pub fn new(source: impl Into<PathBuf>, recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            recordings_dir: recordings_dir.into(),
            captures: Mutex::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    fn with_capture<T>(
        &self,
        handle: CaptureHandle,
        f: impl FnOnce(&mut FileCapture) -> T,
    ) -> Result<T> {
        let mut captures = self.captures.lock().unwrap_or_else(PoisonError::into_inner);
        match captures.get_mut(&handle) {
            Some(capture) => Ok(f(capture)),
            None => bail!("Unknown capture handle {:?}", handle),
        }
    }
}

#[async_trait::async_trait]
impl CaptureDevice for FileCaptureDevice {
    async fn has_permission(&self) -> bool {
        tokio::fs::metadata(&self.source)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn start(&self, config: &CaptureConfig) -> Result<CaptureHandle> {
        tokio::fs::create_dir_all(&self.recordings_dir)
            .await
            .context("Failed to create recordings directory")?;

        let millis = chrono::Utc::now().timestamp_millis();
        let output = self
            .recordings_dir
            .join(format!("recording_{}.{}", millis, config.extension));

        let handle = CaptureHandle::new();
        info!(
            "File capture started: {} -> {} ({}Hz, {}ch, {}bps)",
            self.source.display(),
            output.display(),
            config.sample_rate,
            config.channels,
            config.bit_rate
        );

        self.captures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                handle,
                FileCapture {
                    output,
                    active: Duration::ZERO,
                    running_since: Some(Instant::now()),
                },
            );

        Ok(handle)
    }

    async fn pause(&self, handle: CaptureHandle) -> Result<()> {
        self.with_capture(handle, |c| {
            if let Some(since) = c.running_since.take() {
                c.active += since.elapsed();
            }
        })
    }

    async fn resume(&self, handle: CaptureHandle) -> Result<()> {
        self.with_capture(handle, |c| {
            if c.running_since.is_none() {
                c.running_since = Some(Instant::now());
            }
        })
    }

    async fn stop(&self, handle: CaptureHandle) -> Result<CapturedAudio> {
        let capture = self
            .captures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        let Some(mut capture) = capture else {
            bail!("Unknown capture handle {:?}", handle);
        };

        if let Some(since) = capture.running_since.take() {
            capture.active += since.elapsed();
        }

        tokio::fs::copy(&self.source, &capture.output)
            .await
            .with_context(|| format!("Failed to write capture to {:?}", capture.output))?;

        info!(
            "File capture finished: {} ({:.1}s)",
            capture.output.display(),
            capture.active.as_secs_f64()
        );

        Ok(CapturedAudio {
            path: capture.output,
            duration: capture.active,
        })
    }

    fn name(&self) -> &str {
        "file"
    }
}
