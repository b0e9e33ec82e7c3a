//! Injectable wall-clock sources.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to an explicit instant.
///
/// Used wherever behavior must not depend on real wall time, e.g. tests
/// that check boundary comparisons or DST fallback decisions.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Cell::new(instant),
        }
    }

    /// Moves the pinned instant to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.instant.set(instant);
    }

    /// Moves the pinned instant forward by `delta` (backwards when negative).
    pub fn advance(&self, delta: Duration) {
        self.instant.set(self.instant.get() + delta);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant.get()
    }
}
