//! Recording session lifecycle
//!
//! - `RecordingState` / `SessionTiming`: states and pause-aware elapsed time
//! - `RecordingSession`: transition validation and capture device calls
//! - `Tick`: 1-second elapsed samples emitted only while recording

mod session;
mod state;
mod ticker;

pub use session::{RecordingSession, StoppedCapture};
pub use state::{RecordingState, SessionTiming};
pub use ticker::{Tick, TICK_PERIOD};
