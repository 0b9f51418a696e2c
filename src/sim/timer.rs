//! Polled countdown timers
//!
//! Every duration in the sim is a deadline against the caller's clock:
//! nothing fires by itself, systems poll each tick. Pausing a round shifts
//! each live deadline forward by the paused span so `remaining` picks up
//! exactly where it left off.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    start_ms: u64,
    duration_ms: u64,
    fired: bool,
}

impl Countdown {
    pub fn new(now_ms: u64, duration_ms: u64) -> Self {
        Self {
            start_ms: now_ms,
            duration_ms,
            fired: false,
        }
    }

    pub fn deadline_ms(&self) -> u64 {
        self.start_ms + self.duration_ms
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }

    /// Time until the deadline; negative once past it.
    pub fn remaining_ms(&self, now_ms: u64) -> i64 {
        self.deadline_ms() as i64 - now_ms as i64
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms()
    }

    /// Returns true exactly once, on the first poll at or past the deadline.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.fired || !self.expired(now_ms) {
            return false;
        }
        self.fired = true;
        true
    }

    pub fn restart(&mut self, now_ms: u64, duration_ms: u64) {
        self.start_ms = now_ms;
        self.duration_ms = duration_ms;
        self.fired = false;
    }

    /// Push the deadline forward, used when a paused round resumes.
    pub fn shift(&mut self, delta_ms: u64) {
        self.start_ms += delta_ms;
    }
}
