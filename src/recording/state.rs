use chrono::{DateTime, Local, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Capture lifecycle: `Idle → Recording ⇄ Paused → Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    Idle,
    Recording,
    Paused,
    /// Terminal for the state machine
    Stopped,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Paused => "paused",
            RecordingState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Timing fields of a recording session
///
/// Active time is derived from wall-clock subtraction rather than counted, so
/// missed ticks never skew it:
///
/// `elapsed = end - started_at - paused_accumulated - current_pause`
///
/// where `end` is the stop time once stopped and `now` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTiming {
    pub state: RecordingState,
    pub started_at: Option<DateTime<Local>>,
    /// Total time spent paused in completed pauses. Never decreases.
    pub paused_accumulated: TimeDelta,
    /// Set only while paused
    pub current_pause_started_at: Option<DateTime<Local>>,
    pub stopped_at: Option<DateTime<Local>>,
}

impl SessionTiming {
    pub fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            started_at: None,
            paused_accumulated: TimeDelta::zero(),
            current_pause_started_at: None,
            stopped_at: None,
        }
    }

    pub fn elapsed_active(&self, now: DateTime<Local>) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self.stopped_at.unwrap_or(now);

        let current_pause = match (self.state, self.current_pause_started_at) {
            (RecordingState::Paused, Some(since)) => (end - since).max(TimeDelta::zero()),
            _ => TimeDelta::zero(),
        };

        let active = end - started_at - self.paused_accumulated - current_pause;
        active
            .max(TimeDelta::zero())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub(crate) fn begin(&mut self, now: DateTime<Local>) {
        self.state = RecordingState::Recording;
        self.started_at = Some(now);
        self.paused_accumulated = TimeDelta::zero();
        self.current_pause_started_at = None;
        self.stopped_at = None;
    }

    pub(crate) fn pause(&mut self, now: DateTime<Local>) {
        self.state = RecordingState::Paused;
        self.current_pause_started_at = Some(now);
    }

    pub(crate) fn resume(&mut self, now: DateTime<Local>) {
        self.close_pause(now);
        self.state = RecordingState::Recording;
    }

    pub(crate) fn stop(&mut self, now: DateTime<Local>) {
        self.close_pause(now);
        self.state = RecordingState::Stopped;
        self.stopped_at = Some(now);
    }

    fn close_pause(&mut self, now: DateTime<Local>) {
        if let Some(since) = self.current_pause_started_at.take() {
            let gap = (now - since).max(TimeDelta::zero());
            self.paused_accumulated += gap;
        }
    }
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn lock_timing(timing: &Mutex<SessionTiming>) -> MutexGuard<'_, SessionTiming> {
    timing.lock().unwrap_or_else(PoisonError::into_inner)
}
