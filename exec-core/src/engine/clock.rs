//! Clock collaborator.
//!
//! The engine never reads process-wide time directly; it is handed a clock at
//! construction so event stamping and command deadlines are deterministic
//! under test.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Source of the current UTC instant.
pub trait Clock: Send + Sync {
    fn utc_now(&self) -> DateTime<Utc>;
}

/// System wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug)]
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().expect("test clock poisoned");
        *now += delta;
    }

    /// Set the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut now = self.now.lock().expect("test clock poisoned");
        *now = instant;
    }
}

impl Clock for TestClock {
    fn utc_now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("test clock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_test_clock_advances() {
        let start = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        let clock = TestClock::new(start);
        assert_eq!(clock.utc_now(), start);

        clock.advance(Duration::seconds(10));
        assert_eq!(clock.utc_now(), start + Duration::seconds(10));
    }
}
