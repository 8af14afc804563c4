use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Audio encoder used by the capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoder {
    /// AAC low-complexity in an MPEG-4 container
    AacLc,
}

/// Configuration handed to the capture device on start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub encoder: AudioEncoder,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono)
    pub channels: u16,
    /// Encoder bitrate in bits per second
    pub bit_rate: u32,
    /// Container extension without the dot
    pub extension: &'static str,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            encoder: AudioEncoder::AacLc,
            sample_rate: 22_050,
            channels: 1,
            bit_rate: 64_000,
            extension: "m4a",
        }
    }
}

/// Opaque handle to a capture in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureHandle(pub Uuid);

impl CaptureHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaptureHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A finished, flushed recording on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    pub path: PathBuf,
    /// Duration as reported by the device
    pub duration: Duration,
}

/// Capture device collaborator
///
/// Implementations own the platform recorder. Errors from `start` mean the
/// device or permission is unavailable; `stop` must leave a complete file.
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Whether the user granted recording permission
    async fn has_permission(&self) -> bool;

    async fn start(&self, config: &CaptureConfig) -> Result<CaptureHandle>;

    async fn pause(&self, handle: CaptureHandle) -> Result<()>;

    async fn resume(&self, handle: CaptureHandle) -> Result<()>;

    /// Flush and close the capture, returning the finished artifact
    async fn stop(&self, handle: CaptureHandle) -> Result<CapturedAudio>;

    /// Device name for logging
    fn name(&self) -> &str;
}
