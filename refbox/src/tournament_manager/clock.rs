use log::*;
use std::time::Duration;

/// The countdown shown on the main display.
///
/// The clock only knows how to count down. Which duration it is loaded with, and what happens
/// when it reaches zero, is decided by the `TournamentManager`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameClock {
    clock_time: Duration,
    running: bool,
}

/// The clock value captured when a timeout stopped the clock.
///
/// Only `GameClock::snapshot_and_stop()` can create one and `GameClock::restore_and_start()`
/// consumes it, so a restore always has a matching snapshot.
#[derive(Debug, PartialEq, Eq)]
pub struct ClockSnapshot {
    value_at_pause: Duration,
}

impl ClockSnapshot {
    pub fn value_at_pause(&self) -> Duration {
        self.value_at_pause
    }

    /// Changes the value the clock will resume from
    pub fn set_value_at_pause(&mut self, clock_time: Duration) {
        self.value_at_pause = clock_time;
    }
}

impl GameClock {
    pub fn new(clock_time: Duration) -> Self {
        Self {
            clock_time,
            running: false,
        }
    }

    pub fn clock_time(&self) -> Duration {
        self.clock_time
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set(&mut self, clock_time: Duration) {
        self.clock_time = clock_time;
    }

    // Returns true if the clock was started, false if it was already running
    pub fn start(&mut self) -> bool {
        !std::mem::replace(&mut self.running, true)
    }

    // Returns true if the clock was stopped, false if it was already stopped
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    /// Counts the clock down by `elapsed`, stopping at zero.
    ///
    /// Returns `true` only on the tick that takes a running clock from a non-zero value to zero.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if !self.running || self.clock_time.is_zero() {
            return false;
        }
        self.clock_time = self.clock_time.saturating_sub(elapsed);
        trace!("Game clock ticked to {:?}", self.clock_time);
        self.clock_time.is_zero()
    }

    pub fn snapshot_and_stop(&mut self) -> ClockSnapshot {
        self.running = false;
        ClockSnapshot {
            value_at_pause: self.clock_time,
        }
    }

    pub fn restore_and_start(&mut self, snapshot: ClockSnapshot) {
        self.clock_time = snapshot.value_at_pause;
        self.running = true;
    }
}
