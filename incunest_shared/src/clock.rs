//! Time sources for the simulation engine.
//!
//! The engine measures `dt` between `update()` calls through a [`TimeSource`],
//! so the same code runs against the wall clock in production and against a
//! manually advanced [`SimClock`] in the harness and in tests.

use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Simulation clock, advanced explicitly by its owner.
#[derive(Debug)]
pub struct SimClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, dt: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += dt;
    }

    pub fn advance_secs(&self, secs: f64) {
        if secs > 0.0 && secs.is_finite() {
            self.advance(Duration::from_secs_f64(secs));
        }
    }

    /// Simulated time since construction.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SimClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_clock_only_moves_when_advanced() {
        let clock = SimClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - t0, Duration::from_millis(250));
        assert_eq!(clock.elapsed(), Duration::from_millis(250));
    }

    #[test]
    fn advance_secs_ignores_negative_and_nan() {
        let clock = SimClock::new();
        clock.advance_secs(-1.0);
        clock.advance_secs(f64::NAN);
        assert_eq!(clock.elapsed(), Duration::ZERO);
        clock.advance_secs(1.5);
        assert_eq!(clock.elapsed(), Duration::from_millis(1500));
    }
}
