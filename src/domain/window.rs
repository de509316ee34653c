//! Minimum-interval admission windows.
//!
//! Both rate-limit tiers are expressed as "at most N notifications per base
//! period", which is turned into a fixed minimum spacing between two
//! admissions for the same scope.

use std::time::{Duration, Instant};

/// Base period of the per-domain tier.
pub const DOMAIN_BASE_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Base period of the global tier.
pub const GLOBAL_BASE_PERIOD: Duration = Duration::from_secs(60);

/// Derive the minimum spacing between admissions from a rate per base period.
///
/// Rates above one divide the base period evenly. Rates of zero and one both
/// yield the base period itself, so they cannot be told apart.
///
/// # Example
/// ```
/// use rulematch_notify::domain::window::{interval_for, DOMAIN_BASE_PERIOD};
/// use std::time::Duration;
///
/// assert_eq!(interval_for(0, DOMAIN_BASE_PERIOD), Duration::from_secs(300));
/// assert_eq!(interval_for(1, DOMAIN_BASE_PERIOD), Duration::from_secs(300));
/// assert_eq!(interval_for(5, DOMAIN_BASE_PERIOD), Duration::from_secs(60));
/// ```
pub fn interval_for(rate: u32, base: Duration) -> Duration {
    if rate > 1 {
        base / rate
    } else {
        base
    }
}

/// Timestamp of the last admission for one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    last_admit: Instant,
}

impl RateWindow {
    /// Open a window with an admission at `now`.
    pub fn opened_at(now: Instant) -> Self {
        Self { last_admit: now }
    }

    /// When the last admission happened.
    pub fn last_admit(&self) -> Instant {
        self.last_admit
    }

    /// Whether a new admission at `now` respects `interval`.
    ///
    /// A clock that appears to run backwards counts as zero elapsed time.
    pub fn is_open(&self, now: Instant, interval: Duration) -> bool {
        now.saturating_duration_since(self.last_admit) >= interval
    }

    /// Whether the window has been idle for strictly longer than `max_age`.
    pub fn is_stale(&self, now: Instant, max_age: Duration) -> bool {
        now.saturating_duration_since(self.last_admit) > max_age
    }

    /// Try to admit at `now`, moving the window forward only on success.
    pub fn try_admit(&mut self, now: Instant, interval: Duration) -> bool {
        if !self.is_open(now, interval) {
            return false;
        }
        self.last_admit = now;
        true
    }
}
