// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Collection of clock implementations.

use time::OffsetDateTime;

/// Generic definition of a clock.
pub trait Clock {
    /// Returns the current UTC time.
    fn now_utc(&self) -> OffsetDateTime;
}

/// Clock implementation that uses the system clock.
#[derive(Clone, Default)]
pub struct SystemClock {}

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        // Timestamps are truncated to microsecond resolution because that's what PostgreSQL
        // stores, and values read back from the database must compare equal to the originals.
        let now = OffsetDateTime::now_utc();
        now - time::Duration::nanoseconds(i64::from(now.nanosecond() % 1000))
    }
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// A clock that returns a preconfigured instant and that can be modified at will.
    ///
    /// Only supports microsecond-level precision.
    pub struct SettableClock {
        /// Current fake time.
        now: Mutex<OffsetDateTime>,
    }

    impl SettableClock {
        /// Creates a new clock that returns `now` until reconfigured with `set`.
        pub fn new(now: OffsetDateTime) -> Self {
            assert_eq!(0, now.nanosecond() % 1000, "Nanosecond precision not supported");
            Self { now: Mutex::new(now) }
        }

        /// Sets the new value of `now` that the clock returns.
        pub fn set(&self, now: OffsetDateTime) {
            assert_eq!(0, now.nanosecond() % 1000, "Nanosecond precision not supported");
            *self.now.lock().unwrap() = now;
        }

        /// Advances the current time by `delta`.
        pub fn advance(&self, delta: Duration) {
            assert_eq!(0, delta.subsec_nanos() % 1000, "Nanosecond precision not supported");
            *self.now.lock().unwrap() += delta;
        }
    }

    impl Clock for SettableClock {
        fn now_utc(&self) -> OffsetDateTime {
            *self.now.lock().unwrap()
        }
    }

}
