//! Reconnect backoff
//!
//! Capped exponential backoff with jitter so a fleet of clients does not
//! stampede the backend after an outage.

use rand::Rng;
use std::time::Duration;

/// Capped exponential backoff
#[derive(Debug)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    /// Delay before the next attempt, with up to 25% jitter
    pub fn next_delay(&mut self) -> Duration {
        let exp = self.base.saturating_mul(1_u32 << self.attempt.min(16));
        let capped = exp.min(self.max);
        self.attempt = self.attempt.saturating_add(1);

        let jitter = rand::thread_rng().gen_range(0.0..=0.25);
        capped.mul_f64(1.0 + jitter)
    }

    /// Reset after a successful connection
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Attempts since the last reset
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
