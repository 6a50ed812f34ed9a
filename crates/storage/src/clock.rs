// Copyright 2024 The Gantry developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A [`Clock`] is the only way the rest of the code base gets the current
//! date and time.
//!
//! [`SystemClock`] reads the system time. [`MockClock`] starts at a fixed
//! instant and only moves when told to, which keeps timestamps stored by the
//! tests deterministic.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use chrono::{DateTime, TimeZone, Utc};

/// Represents a clock which can give the current date and time
pub trait Clock: Sync {
    /// Get the current date and time
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + Send + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// A clock which uses the system time
#[derive(Clone, Default)]
pub struct SystemClock {
    _private: (),
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        // This is the clock used elsewhere, it's fine to call Utc::now here
        #[allow(clippy::disallowed_methods)]
        Utc::now()
    }
}

/// A fake clock with second precision, frozen until [`MockClock::advance`]
/// is called.
///
/// ```rust
/// use gantry_storage::clock::{Clock, MockClock};
/// use chrono::Duration;
///
/// let clock = MockClock::default();
/// let before = clock.now();
/// clock.advance(Duration::minutes(5));
/// assert_eq!(clock.now() - before, Duration::minutes(5));
/// ```
pub struct MockClock {
    seconds: AtomicI64,
}

impl Default for MockClock {
    fn default() -> Self {
        let datetime = Utc
            .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
            .single()
            .unwrap_or_default();
        Self::new(datetime)
    }
}

impl MockClock {
    /// Create a new clock frozen at the given datetime
    #[must_use]
    pub fn new(datetime: DateTime<Utc>) -> Self {
        Self {
            seconds: AtomicI64::new(datetime.timestamp()),
        }
    }

    /// Move the clock forward by the given amount of time
    pub fn advance(&self, duration: chrono::Duration) {
        self.seconds
            .fetch_add(duration.num_seconds(), Ordering::Relaxed);
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        let seconds = self.seconds.load(Ordering::Relaxed);
        Utc.timestamp_opt(seconds, 0).single().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn mock_clock_is_frozen_until_advanced() {
        let clock = MockClock::default();

        let first = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(first, clock.now());

        clock.advance(Duration::hours(1));
        assert_eq!(clock.now(), first + Duration::hours(1));
    }

    #[test]
    fn mock_clock_shared_through_arc() {
        let clock = Arc::new(MockClock::default());
        let boxed: Box<dyn Clock + Send> = Box::new(Arc::clone(&clock));

        clock.advance(Duration::seconds(30));
        assert_eq!(boxed.now(), clock.now());
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock::default();

        let first = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = clock.now();

        assert!(first < second);
    }
}
