//! Payment countdown.
//!
//! An unpaid booking can be paid for `maxPaymentMinutes` after it was
//! created. [`derive`] turns the booking time, the carrier's window and the
//! current time into what the passenger sees. It has no hidden state, so
//! the tickets reducer can call it on every tick with the injected clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remaining payment window at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    /// `m:ss`, or `0:00` once the window is over
    pub display: String,
    /// Whole minutes shown
    pub minutes: u32,
    /// Seconds shown, `0..=59`
    pub seconds: u32,
    /// The window is over; pay-now is disabled
    pub expired: bool,
}

impl Countdown {
    /// The zero state
    #[must_use]
    pub fn expired() -> Self {
        Self {
            display: "0:00".to_string(),
            minutes: 0,
            seconds: 0,
            expired: true,
        }
    }

    /// Returns `true` while the booking can still be paid
    #[must_use]
    pub const fn is_payable(&self) -> bool {
        !self.expired
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Derive the countdown for a booking created at `booking_date`
///
/// With `elapsed` the whole seconds since booking:
///
/// - `elapsed / 60 >= max_payment_minutes`: expired, `0:00`
/// - otherwise `minutes_left = max - elapsed / 60` and
///   `seconds_left = 60 - elapsed % 60`; a full 60 shows as
///   `minutes_left:00`, anything less as `(minutes_left - 1):ss`
///
/// A booking time in the future (clock skew) counts as zero elapsed.
///
/// ```
/// use busline::countdown::derive;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2025, 10, 28, 9, 0, 0).unwrap();
/// let booked = now - Duration::seconds(14 * 60 + 30);
/// assert_eq!(derive(booked, 15, now).display, "0:30");
/// ```
#[must_use]
pub fn derive(booking_date: DateTime<Utc>, max_payment_minutes: u32, now: DateTime<Utc>) -> Countdown {
    let elapsed_secs = u64::try_from((now - booking_date).num_seconds()).unwrap_or(0);
    let elapsed_minutes = elapsed_secs / 60;

    if elapsed_minutes >= u64::from(max_payment_minutes) {
        return Countdown::expired();
    }

    // elapsed_minutes < max_payment_minutes, so both fit in u32
    let minutes_left = max_payment_minutes - u32::try_from(elapsed_minutes).unwrap_or(max_payment_minutes);
    let seconds_left = 60 - u32::try_from(elapsed_secs % 60).unwrap_or(0);

    let (minutes, seconds) = if seconds_left == 60 {
        (minutes_left, 0)
    } else {
        (minutes_left - 1, seconds_left)
    };

    Countdown {
        display: format!("{minutes}:{seconds:02}"),
        minutes,
        seconds,
        expired: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busline_testing::test_time;
    use chrono::Duration;
    use proptest::prelude::*;

    fn at(elapsed: Duration, max: u32) -> Countdown {
        let now = test_time();
        derive(now - elapsed, max, now)
    }

    #[test]
    fn fourteen_and_a_half_minutes_into_fifteen() {
        let countdown = at(Duration::seconds(14 * 60 + 30), 15);
        assert_eq!(countdown.display, "0:30");
        assert!(countdown.is_payable());
    }

    #[test]
    fn full_minute_boundary_is_not_borrowed() {
        assert_eq!(at(Duration::zero(), 15).display, "15:00");
        assert_eq!(at(Duration::seconds(1), 15).display, "14:59");
        assert_eq!(at(Duration::seconds(60), 15).display, "14:00");
        assert_eq!(at(Duration::seconds(61), 15).display, "13:59");
    }

    #[test]
    fn window_over_is_zero() {
        assert_eq!(at(Duration::minutes(15), 15), Countdown::expired());
        assert_eq!(at(Duration::hours(3), 15).display, "0:00");
        assert!(!at(Duration::minutes(15), 15).is_payable());
    }

    #[test]
    fn zero_minute_window_is_expired_immediately() {
        assert!(at(Duration::zero(), 0).expired);
    }

    #[test]
    fn future_booking_time_counts_as_just_booked() {
        assert_eq!(at(Duration::seconds(-90), 10).display, "10:00");
    }

    proptest! {
        #[test]
        fn expired_exactly_when_elapsed_minutes_reach_window(
            elapsed in 0i64..100_000,
            max in 0u32..600,
        ) {
            let countdown = at(Duration::seconds(elapsed), max);
            let expired = elapsed / 60 >= i64::from(max);
            prop_assert_eq!(countdown.expired, expired);
            if expired {
                prop_assert_eq!(countdown.display.as_str(), "0:00");
            }
        }

        #[test]
        fn shown_time_plus_elapsed_is_the_window(
            elapsed in 0i64..36_000,
            max in 1u32..600,
        ) {
            prop_assume!(elapsed / 60 < i64::from(max));
            let countdown = at(Duration::seconds(elapsed), max);
            let shown = i64::from(countdown.minutes) * 60 + i64::from(countdown.seconds);
            prop_assert_eq!(shown + elapsed, i64::from(max) * 60);
            prop_assert!(countdown.seconds < 60);
        }
    }
}
