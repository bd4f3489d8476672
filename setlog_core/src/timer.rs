//! Recovery timer between sets.
//!
//! The caller drives the countdown by invoking [`RecoveryTimer::tick`] once
//! per second. There is one timer per session; starting it again simply
//! replaces the previous countdown.

use serde::{Deserialize, Serialize};

/// Seconds added by [`RecoveryTimer::extend`]
pub const EXTEND_SECONDS: u32 = 30;

/// Result of one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// Timer was not running
    Idle,
    /// Still counting, with this many seconds left
    Ticked(u32),
    /// Countdown reached zero on this tick
    RecoveryComplete,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecoveryTimer {
    remaining: u32,
    running: bool,
    /// Exercise index whose set completion started the countdown
    exercise: Option<usize>,
}

impl RecoveryTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn exercise(&self) -> Option<usize> {
        self.exercise
    }

    /// (Re)start the countdown for the given exercise
    pub fn start(&mut self, seconds: u32, exercise: usize) {
        if self.running {
            tracing::debug!(
                "Recovery timer restarted for exercise {} ({}s were left)",
                exercise,
                self.remaining
            );
        }
        self.remaining = seconds;
        self.running = true;
        self.exercise = Some(exercise);
    }

    pub fn tick(&mut self) -> TimerEvent {
        if !self.running {
            return TimerEvent::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            tracing::info!("Recovery complete");
            TimerEvent::RecoveryComplete
        } else {
            TimerEvent::Ticked(self.remaining)
        }
    }

    /// Add [`EXTEND_SECONDS`] to the remaining time without touching the running flag
    pub fn extend(&mut self) {
        self.remaining = self.remaining.saturating_add(EXTEND_SECONDS);
    }

    /// Stop and zero immediately
    pub fn cancel(&mut self) {
        self.remaining = 0;
        self.running = false;
        self.exercise = None;
    }
}
