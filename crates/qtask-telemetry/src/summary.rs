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

//! Decides when a periodic statistics summary is due.

use qtask_core::{Clock, Stopwatch};
use std::sync::Arc;

/// Gates a periodic summary to at most once per interval.
#[derive(Debug)]
pub struct SummaryInterval {
    last_summary_time: Stopwatch,
    summary_interval_secs: f64,
}

impl SummaryInterval {
    /// Creates a new cadence with the specified summary interval.
    pub fn new(clock: Arc<dyn Clock>, summary_interval_secs: f64) -> Self {
        Self {
            last_summary_time: Stopwatch::new(clock),
            summary_interval_secs,
        }
    }

    /// Checks if it's time to log a summary.
    pub fn should_log_summary(&self) -> bool {
        let time_since_last = self.last_summary_time.elapsed_secs_f64().unwrap_or(0.0);
        time_since_last >= self.summary_interval_secs
    }

    /// Marks that a summary has been logged, resetting the timer.
    pub fn mark_summary_logged(&mut self) {
        self.last_summary_time.start();
    }

    /// Gets the current interval in seconds.
    pub fn interval_secs(&self) -> f64 {
        self.summary_interval_secs
    }

    /// Sets a new interval in seconds.
    pub fn set_interval_secs(&mut self, interval_secs: f64) {
        self.summary_interval_secs = interval_secs;
    }
}
