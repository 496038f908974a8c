//! Wall-clock abstraction and time unit constants.
//!
//! All core timestamps are Unix epoch milliseconds (`i64`). Time is always
//! injected through [`Clock`]; nothing in core reads the system clock
//! directly except [`SystemClock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds per hour.
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// Milliseconds per day.
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Converts whole days to milliseconds.
pub fn days_to_ms(days: u32) -> i64 {
    i64::from(days) * DAY_MS
}

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Clock backed by the operating system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Manually driven clock for deterministic callers and tests.
#[derive(Debug, Default)]
pub struct FixedClock {
    now_ms: AtomicI64,
}

impl FixedClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Moves the clock forward by `delta_ms` and returns the new time.
    pub fn advance(&self, delta_ms: i64) -> i64 {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::{days_to_ms, Clock, FixedClock, SystemClock, DAY_MS};

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(1_000);
        assert_eq!(clock.advance(DAY_MS), 1_000 + DAY_MS);
        assert_eq!(clock.now_ms(), 1_000 + DAY_MS);
        clock.set(5);
        assert_eq!(clock.now_ms(), 5);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn days_convert_to_ms() {
        assert_eq!(days_to_ms(7), 7 * 86_400_000);
    }
}
