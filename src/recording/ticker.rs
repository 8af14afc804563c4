use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;
use uuid::Uuid;

use super::state::{lock_timing, RecordingState, SessionTiming};
use crate::clock::Clock;

/// Display cadence while recording
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Periodic elapsed-time sample for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tick {
    pub session_id: Uuid,
    pub elapsed: Duration,
    pub at: DateTime<Local>,
}

/// Cancellable periodic task sampling elapsed time while recording
///
/// Each sample is taken and sent under the timing lock after checking the
/// state, so no tick can follow a pause or stop transition. Dropping the
/// ticker aborts the task.
pub(crate) struct ElapsedTicker {
    handle: JoinHandle<()>,
}

impl ElapsedTicker {
    pub(crate) fn spawn(
        session_id: Uuid,
        timing: Arc<Mutex<SessionTiming>>,
        clock: Arc<dyn Clock>,
        ticks: broadcast::Sender<Tick>,
        period: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let timing = lock_timing(&timing);
                if timing.state != RecordingState::Recording {
                    break;
                }

                let at = clock.now();
                let elapsed = timing.elapsed_active(at);
                debug!("Tick {}: {:.1}s", session_id, elapsed.as_secs_f64());

                // No subscribers is fine
                let _ = ticks.send(Tick {
                    session_id,
                    elapsed,
                    at,
                });
            }
        });

        Self { handle }
    }

    pub(crate) fn cancel(self) {
        drop(self);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
