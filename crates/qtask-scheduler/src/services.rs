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

//! Host services handed to every scheduler component.

use qtask_core::{Clock, DiagnosticSink, Dispatcher, MonotonicClock};
use qtask_telemetry::LogSink;
use std::sync::Arc;

/// The handles a scheduler, its batches, and its tasks need from the host.
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct SchedulerServices {
    /// Hands callbacks to their execution context.
    pub dispatcher: Arc<dyn Dispatcher>,
    /// Receives warnings and errors.
    pub sink: Arc<dyn DiagnosticSink>,
    /// Measures task and batch lifetimes.
    pub clock: Arc<dyn Clock>,
}

impl SchedulerServices {
    /// Bundles explicit host services.
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        sink: Arc<dyn DiagnosticSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            dispatcher,
            sink,
            clock,
        }
    }

    /// Uses the `log` facade and wall-clock time alongside `dispatcher`.
    pub fn with_defaults(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self::new(
            dispatcher,
            Arc::new(LogSink::new()),
            Arc::new(MonotonicClock::new()),
        )
    }
}

impl std::fmt::Debug for SchedulerServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerServices")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
