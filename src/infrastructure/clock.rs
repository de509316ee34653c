//! Clock adapters for rate windows.
//!
//! Provides the monotonic `SystemClock` used in production. Tests drive the
//! limiters with `MockClock` from `crate::infrastructure::mocks`, available in
//! test builds or with the `test-helpers` feature.

use crate::application::ports::Clock;
use std::time::Instant;

/// Monotonic system clock backed by `Instant::now()`.
///
/// Wall-clock adjustments (NTP steps, manual changes) never reopen or freeze a
/// rate window.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
