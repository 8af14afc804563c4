//! Session control
//!
//! This module provides the `SessionController` the presentation layer talks to:
//! - start/pause/resume/stop delegated to the recording state machine
//! - upload (snapshot labels → commit) and discard of the stopped artifact
//! - a watch channel of `SessionSnapshot`s and a broadcast of elapsed ticks

mod controller;
mod snapshot;

pub use controller::SessionController;
pub use snapshot::{SessionSnapshot, SessionState};
