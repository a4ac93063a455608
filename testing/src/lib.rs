//! # Busline Testing
//!
//! Testing utilities for the Busline booking client.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `ManualClock`)
//! - A Given-When-Then harness for reducers
//! - Assertion helpers for effect lists
//!
//! ## Example
//!
//! ```ignore
//! use busline_testing::ManualClock;
//! use busline_runtime::Store;
//!
//! #[tokio::test]
//! async fn countdown_reaches_zero() {
//!     let clock = ManualClock::at(booked_at);
//!     let store = Store::new(TicketState::default(), TicketReducer::new(), env(clock.clone()));
//!
//!     clock.advance(chrono::Duration::minutes(15));
//!     store.send(TicketAction::CountdownTick { generation: 1 }).await.unwrap();
//!
//!     let display = store.state(|s| s.countdown.current.clone()).await;
//!     assert_eq!(display.map(|c| c.display).as_deref(), Some("0:00"));
//! }
//! ```

use busline_core::environment::Clock;
use chrono::{DateTime, Utc};

mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use busline_testing::mocks::FixedClock;
    /// use busline_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when a test advances it
    ///
    /// Clones share the same time, so a test can keep one handle and pass
    /// another into an environment.
    ///
    /// ```
    /// use busline_testing::mocks::ManualClock;
    /// use busline_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let start = Utc::now();
    /// let clock = ManualClock::at(start);
    /// clock.advance(Duration::seconds(30));
    /// assert_eq!(clock.now(), start + Duration::seconds(30));
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock stopped at `time`
        #[must_use]
        pub fn at(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = match self.time.write() {
                Ok(time) => time,
                Err(poisoned) => poisoned.into_inner(),
            };
            *time += by;
        }

        /// Jump to an absolute time
        pub fn set(&self, to: DateTime<Utc>) {
            let mut time = match self.time.write() {
                Ok(time) => time,
                Err(poisoned) => poisoned.into_inner(),
            };
            *time = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            match self.time.read() {
                Ok(time) => *time,
                Err(poisoned) => *poisoned.into_inner(),
            }
        }
    }

    /// Create a default fixed clock for tests (2025-10-28 09:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Never in practice; the timestamp is a literal.
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_time())
    }

    /// The instant `test_clock()` is fixed at
    ///
    /// # Panics
    ///
    /// Never in practice; the timestamp is a literal.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-10-28T09:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc)
    }
}

/// Install a test-friendly tracing subscriber
///
/// Honors `RUST_LOG`, writes through the test writer so output is captured
/// per test, and is safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busline=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub use mocks::{test_clock, test_time, FixedClock, ManualClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now(), test_time());
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::at(test_time());
        let shared = clock.clone();

        clock.advance(chrono::Duration::minutes(14));
        assert_eq!(shared.now(), test_time() + chrono::Duration::minutes(14));

        shared.set(test_time());
        assert_eq!(clock.now(), test_time());
    }
}
