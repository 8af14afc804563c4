use chrono::{DateTime, Local, TimeDelta};
use std::sync::{Mutex, PoisonError};
use tokio::time::Instant;

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock read once, then advanced by the monotonic tokio clock.
///
/// Wall-clock steps (NTP, manual changes) after construction never reach
/// elapsed-time arithmetic. Under a paused tokio runtime it follows virtual time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor_wall: DateTime<Local>,
    anchor_instant: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor_wall: Local::now(),
            anchor_instant: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        let since = Instant::now().saturating_duration_since(self.anchor_instant);
        let delta = TimeDelta::from_std(since).unwrap_or(TimeDelta::MAX);
        self.anchor_wall
            .checked_add_signed(delta)
            .unwrap_or(self.anchor_wall)
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }

    pub fn advance(&self, by: std::time::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
        *now = now.checked_add_signed(delta).unwrap_or(*now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
