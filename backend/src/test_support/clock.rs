//! Controllable clock for deterministic timestamps in tests.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Clock frozen at 2024-01-01T00:00:00Z.
    pub fn at_epoch_of_tests() -> Self {
        let start = match Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single() {
            Some(start) => start,
            None => panic!("fixed start time is unambiguous"),
        };
        Self::new(start)
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.advance(TimeDelta::seconds(seconds));
    }

    /// Move the clock backwards, e.g. to simulate a stepped system clock.
    pub fn rewind_seconds(&self, seconds: i64) {
        *self.lock_clock() -= TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn only_moves_when_told() {
        let clock = MutableClock::at_epoch_of_tests();
        let start = clock.utc();
        assert_eq!(clock.utc(), start);

        clock.advance_seconds(2);
        assert_eq!(clock.utc(), start + TimeDelta::seconds(2));

        clock.rewind_seconds(5);
        assert_eq!(clock.utc(), start - TimeDelta::seconds(3));
    }
}
