//! Wall-clock access for age-based operations.
//!
//! Pruning and `since` queries measure sample age against "now". The store
//! reads the time through a [`Clock`] so that tests can pin it with a
//! [`MockClock`]. Timestamps throughout vitals are nanoseconds since the
//! Unix epoch.

use std::fmt::Debug;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

/// Source of the current wall-clock time.
pub trait Clock: Debug + Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;

    /// Returns the current time in nanoseconds since the Unix epoch.
    fn now_ns(&self) -> u64 {
        unix_nanos(self.now())
    }
}

/// Clock backed by [`SystemTime::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct MockClock {
    now: RwLock<SystemTime>,
}

impl MockClock {
    /// Creates a clock frozen at `time`.
    pub fn with_time(time: SystemTime) -> Self {
        Self {
            now: RwLock::new(time),
        }
    }

    /// Creates a clock frozen at `ns` nanoseconds since the Unix epoch.
    pub fn with_nanos(ns: u64) -> Self {
        Self::with_time(UNIX_EPOCH + Duration::from_nanos(ns))
    }

    /// Moves the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.write();
        *now += duration;
    }

    /// Sets the clock to `time`.
    pub fn set_time(&self, time: SystemTime) {
        *self.now.write() = time;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::with_time(SystemTime::now())
    }
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        *self.now.read()
    }
}

/// Converts a `SystemTime` to nanoseconds since the Unix epoch.
///
/// Times before the epoch map to 0; times past year 2554 saturate.
pub fn unix_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map_or(0, duration_nanos)
}

/// Converts a `Duration` to whole nanoseconds, saturating at `u64::MAX`.
pub fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
