//! Timestamp rules shared by every repository adapter.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use mockable::Clock;

/// Current clock time at the precision PostgreSQL stores (microseconds).
pub(crate) fn storage_now(clock: &dyn Clock) -> DateTime<Utc> {
    clock.utc().trunc_subsecs(6)
}

/// Next `updated_at` for a row last touched at `previous`.
///
/// Always strictly later than `previous`, even when the clock has not moved
/// or has stepped backwards.
pub(crate) fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous + TimeDelta::microseconds(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockable::MockClock;
    use rstest::rstest;

    fn at(nanos: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
            .single()
            .expect("valid fixture timestamp")
            + TimeDelta::nanoseconds(i64::from(nanos))
    }

    #[rstest]
    fn storage_now_truncates_to_microseconds() {
        let mut clock = MockClock::new();
        clock.expect_utc().return_const(at(1_234_567));

        assert_eq!(storage_now(&clock), at(1_234_000));
    }

    #[rstest]
    #[case(at(0), at(5_000), at(5_000))]
    #[case(at(5_000), at(5_000), at(6_000))]
    #[case(at(9_000), at(5_000), at(10_000))]
    fn updated_at_strictly_advances(
        #[case] previous: DateTime<Utc>,
        #[case] now: DateTime<Utc>,
        #[case] expected: DateTime<Utc>,
    ) {
        assert_eq!(next_updated_at(previous, now), expected);
    }
}
