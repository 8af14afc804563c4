pub mod backend;
pub mod file;

pub use backend::{AudioEncoder, CaptureConfig, CaptureDevice, CaptureHandle, CapturedAudio};
pub use file::FileCaptureDevice;
