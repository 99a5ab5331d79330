// Copyright 2025 eraflo
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

//! A stopwatch measured against an injected [`Clock`].

use crate::utils::clock::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Measures elapsed time since it was started.
///
/// A stopwatch created with [`Stopwatch::idle`] reports `None` until
/// [`Stopwatch::start`] is called; tasks use this to start their lifetime
/// timer on first execution rather than on construction.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    clock: Arc<dyn Clock>,
    start_time: Option<Duration>,
}

impl Stopwatch {
    /// Creates a new Stopwatch that is already running.
    /// ## Arguments
    /// * `clock` - The time source to measure against.
    /// ## Returns
    /// A new instance of the Stopwatch struct.
    #[inline]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let start_time = Some(clock.now());
        Self { clock, start_time }
    }

    /// Creates a Stopwatch that has not been started yet.
    #[inline]
    pub fn idle(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            start_time: None,
        }
    }

    /// Starts (or restarts) the stopwatch from the clock's current time.
    #[inline]
    pub fn start(&mut self) {
        self.start_time = Some(self.clock.now());
    }

    /// Returns `true` once the stopwatch has been started.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    /// Returns the elapsed time since the stopwatch was started.
    /// ## Returns
    /// An Option containing the elapsed time as a Duration, or None if the stopwatch has not been started.
    #[inline]
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time
            .map(|start| self.clock.now().saturating_sub(start))
    }

    /// Returns the elapsed time since the stopwatch was started in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> Option<u64> {
        self.elapsed().map(|d| d.as_millis() as u64)
    }

    /// Returns the elapsed time since the stopwatch was started in microseconds.
    #[inline]
    pub fn elapsed_us(&self) -> Option<u64> {
        self.elapsed().map(|d| d.as_micros() as u64)
    }

    /// Returns the elapsed time since the stopwatch was started in seconds as f64.
    #[inline]
    pub fn elapsed_secs_f64(&self) -> Option<f64> {
        self.elapsed().map(|d| d.as_secs_f64())
    }

    /// Returns `true` if the stopwatch is running and more than `limit` has elapsed.
    #[inline]
    pub fn exceeded(&self, limit: Duration) -> bool {
        self.elapsed().is_some_and(|elapsed| elapsed > limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::{ManualClock, MonotonicClock};
    use std::thread;

    const SMALL_DURATION_MS: u64 = 15;
    const SLEEP_DURATION_MS: u64 = 100;
    const SLEEP_MARGIN_MS: u64 = 200;

    fn manual() -> (Arc<ManualClock>, Arc<dyn Clock>) {
        let clock = Arc::new(ManualClock::new());
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        (clock, dyn_clock)
    }

    /// A freshly created stopwatch is running and reports a tiny elapsed time.
    #[test]
    fn stopwatch_creation_starts_timer() {
        let watch = Stopwatch::new(Arc::new(MonotonicClock::new()));
        assert!(watch.is_running());
        let elapsed_ms = watch.elapsed_ms().expect("Should have elapsed ms");
        assert!(
            elapsed_ms < SMALL_DURATION_MS,
            "Initial elapsed ms ({elapsed_ms}) should be very small"
        );
    }

    /// An idle stopwatch reports nothing until started.
    #[test]
    fn stopwatch_idle_until_started() {
        let (clock, dyn_clock) = manual();
        let mut watch = Stopwatch::idle(dyn_clock);
        assert!(!watch.is_running());
        assert!(watch.elapsed().is_none());
        assert!(watch.elapsed_us().is_none());
        assert!(!watch.exceeded(Duration::ZERO));

        clock.advance(Duration::from_secs(5));
        watch.start();
        clock.advance(Duration::from_millis(1500));

        assert_eq!(watch.elapsed(), Some(Duration::from_millis(1500)));
        assert_eq!(watch.elapsed_ms(), Some(1500));
        assert_eq!(watch.elapsed_secs_f64(), Some(1.5));
    }

    /// `exceeded` is a strict comparison.
    #[test]
    fn stopwatch_exceeded_is_strict() {
        let (clock, dyn_clock) = manual();
        let watch = Stopwatch::new(dyn_clock);
        clock.advance(Duration::from_secs(20));
        assert!(!watch.exceeded(Duration::from_secs(20)));
        clock.advance(Duration::from_millis(1));
        assert!(watch.exceeded(Duration::from_secs(20)));
    }

    /// Wall-clock elapsed time after a sleep lands within a generous margin.
    #[test]
    fn stopwatch_elapsed_time_after_delay() {
        let watch = Stopwatch::new(Arc::new(MonotonicClock::new()));
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));

        let elapsed_ms = watch
            .elapsed_ms()
            .expect("Should have elapsed ms after sleep");
        assert!(
            elapsed_ms >= SLEEP_DURATION_MS,
            "Elapsed ms ({elapsed_ms}) should be >= sleep duration ms ({SLEEP_DURATION_MS})"
        );
        assert!(
            elapsed_ms < SLEEP_DURATION_MS + SLEEP_MARGIN_MS,
            "Elapsed ms ({elapsed_ms}) should be < sleep duration ms + margin"
        );
    }

    /// Clones share the start time of the stopwatch they were cloned from.
    #[test]
    fn stopwatch_clone() {
        let (clock, dyn_clock) = manual();
        let watch1 = Stopwatch::new(dyn_clock);
        clock.advance(Duration::from_millis(10));
        let watch2 = watch1.clone();
        clock.advance(Duration::from_millis(10));

        assert_eq!(watch1.elapsed(), watch2.elapsed());
        assert_eq!(watch2.elapsed_ms(), Some(20));
    }
}
