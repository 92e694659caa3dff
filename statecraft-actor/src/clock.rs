//! The `std::time::Instant`-backed [`Clock`](statecraft::Clock) the actor
//! supplies to `Hsm::update`, referenced from `statecraft`'s crate docs.

use std::time::{Duration, Instant};

use statecraft::Clock;

/// Measures elapsed time from the moment the clock is created. Two
/// `SystemClock`s created at different times are not comparable; an actor
/// creates exactly one and shares it between its own run loop and every
/// `Hsm::update` call.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}
