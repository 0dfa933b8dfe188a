//! Injectable wall clock
//!
//! All wall-clock reads in the booking core go through [`Clock`] so that
//! time-dependent logic (past-date checks, "occupied now" badges) is
//! deterministic in tests. Use [`SystemClock`] in production and
//! [`MockClock`] in tests.
//!
//! Dates and times are local naive values: availability works on
//! local-date-string semantics, never timezone-shifted instants.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::Mutex;

/// Trait for wall-clock reads to enable testing
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Current local time of day.
    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }
}

/// Real system clock implementation. Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Mock clock for deterministic testing.
///
/// Time stands still until [`MockClock::set`] or [`MockClock::advance`] is
/// called.
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<NaiveDateTime>,
}

impl MockClock {
    /// Create a mock clock pinned to the given moment.
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Replace the current moment.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for MockClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}
