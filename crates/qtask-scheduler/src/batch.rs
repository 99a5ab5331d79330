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

//! Ordered groups of tasks advanced and retired together.

use crate::config::SchedulerConfig;
use crate::error::TaskError;
use crate::services::SchedulerServices;
use crate::task::{Task, TaskStatus};
use log::Level;
use qtask_core::diagnostics::codes;
use qtask_core::{DiagnosticSink, Stopwatch};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Which scheduler lane a batch is queued on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueClass {
    /// Ordinary work, drained first-in first-out.
    #[default]
    Primary,
    /// Cleanup work, drained last-in first-out once the primary lane is empty.
    Final,
}

impl QueueClass {
    /// One-letter tag used in queue dumps.
    pub fn tag(self) -> char {
        match self {
            QueueClass::Primary => 'P',
            QueueClass::Final => 'F',
        }
    }
}

/// Position of a [`Batch`] in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Not yet advanced.
    Start,
    /// Waiting on the prefix barrier before releasing the tasks.
    Prefix,
    /// Tasks released; waiting for all of them to finish.
    Processing,
    /// Waiting on the postfix barrier.
    Postfix,
    /// Done or expired. Terminal.
    Finished,
}

/// A group of tasks with a shared lifetime ceiling.
///
/// Advances one step per [`update`](Self::update):
///
/// ```text
/// Start -> [Prefix] -> Processing -> [Postfix] -> Finished
/// ```
///
/// The bracketed states only occur for batches built with
/// [`with_barriers`](Self::with_barriers).
pub struct Batch {
    name: String,
    queue: QueueClass,
    units: Vec<Task>,
    size: usize,
    prefix: Option<Task>,
    postfix: Option<Task>,
    status: BatchStatus,
    created_at: Duration,
    max_lifetime: Duration,
    timer: Stopwatch,
    expired: bool,
    completed: usize,
    expired_units: usize,
    sink: Arc<dyn DiagnosticSink>,
}

impl Batch {
    /// Creates a batch over `units`, kept in insertion order.
    ///
    /// ## Arguments
    ///
    /// * `units` - The tasks to run.
    /// * `name` - Label used in diagnostics.
    /// * `queue` - Lane the batch is enqueued on.
    /// * `services` - Sink and clock for diagnostics and the lifetime guard.
    /// * `config` - Supplies the lifetime ceiling for `units.len()` tasks.
    pub fn new(
        units: Vec<Task>,
        name: impl Into<String>,
        queue: QueueClass,
        services: &SchedulerServices,
        config: &SchedulerConfig,
    ) -> Self {
        Self::with_barriers(units, None, None, name, queue, services, config)
    }

    /// Creates a batch whose tasks are bracketed by barrier tasks.
    ///
    /// `prefix` must finish before any task in `units` is executed, and
    /// `postfix` is executed only after all of them have finished. Barriers do
    /// not count towards the batch lifetime or [`size`](Self::size).
    pub fn with_barriers(
        units: Vec<Task>,
        prefix: Option<Task>,
        postfix: Option<Task>,
        name: impl Into<String>,
        queue: QueueClass,
        services: &SchedulerServices,
        config: &SchedulerConfig,
    ) -> Self {
        let size = units.len();
        Self {
            name: name.into(),
            queue,
            units,
            size,
            prefix,
            postfix,
            status: BatchStatus::Start,
            created_at: services.clock.now(),
            max_lifetime: config.batch_lifetime(size),
            timer: Stopwatch::idle(services.clock.clone()),
            expired: false,
            completed: 0,
            expired_units: 0,
            sink: services.sink.clone(),
        }
    }

    /// Advances the batch by one step.
    ///
    /// The lifetime ceiling starts counting on the first call. Calling this
    /// on a finished batch does nothing.
    ///
    /// # Errors
    ///
    /// Propagates [`TaskError`] from a task bound to an invalid context.
    pub fn update(&mut self) -> Result<BatchStatus, TaskError> {
        if self.status == BatchStatus::Finished {
            return Ok(self.status);
        }

        if !self.timer.is_running() {
            self.timer.start();
        } else if self.timer.exceeded(self.max_lifetime) {
            self.expire();
            return Ok(self.status);
        }

        if self.sink.enabled(Level::Debug) {
            self.sink.debug(&format!(
                "Batch [{}] Tasks:{}, Status:{:?}",
                self.name,
                self.units.len(),
                self.status
            ));
        }

        match self.status {
            BatchStatus::Start => match self.prefix.as_mut() {
                Some(prefix) => {
                    self.status = BatchStatus::Prefix;
                    prefix.execute()?;
                }
                None => self.release()?,
            },
            BatchStatus::Prefix => {
                if advance_barrier(&mut self.prefix)? {
                    self.release()?;
                }
            }
            BatchStatus::Processing => {
                self.scan()?;
                if self.units.is_empty() {
                    self.close()?;
                }
            }
            BatchStatus::Postfix => {
                if advance_barrier(&mut self.postfix)? {
                    self.finish();
                }
            }
            BatchStatus::Finished => {}
        }
        Ok(self.status)
    }

    /// Fires every task once, in insertion order.
    fn release(&mut self) -> Result<(), TaskError> {
        self.status = BatchStatus::Processing;
        for unit in &mut self.units {
            unit.execute()?;
        }
        if self.units.is_empty() {
            self.close()?;
        }
        Ok(())
    }

    /// Drops finished tasks and re-fires waiting ones.
    fn scan(&mut self) -> Result<(), TaskError> {
        let mut result = Ok(());
        let mut completed = 0;
        let mut expired = 0;

        self.units.retain_mut(|unit| {
            if result.is_err() {
                return true;
            }
            match unit.poll() {
                TaskStatus::Finished => {
                    if unit.was_expired() {
                        expired += 1;
                    } else {
                        completed += 1;
                    }
                    false
                }
                TaskStatus::Waiting => {
                    result = unit.execute();
                    true
                }
                TaskStatus::Processing => true,
            }
        });

        self.completed += completed;
        self.expired_units += expired;
        result
    }

    fn close(&mut self) -> Result<(), TaskError> {
        match self.postfix.as_mut() {
            Some(postfix) => {
                self.status = BatchStatus::Postfix;
                postfix.execute()
            }
            None => {
                self.finish();
                Ok(())
            }
        }
    }

    fn finish(&mut self) {
        self.status = BatchStatus::Finished;
        self.sink.debug(&format!(
            "Batch [{}] finished: {} completed, {} expired.",
            self.name, self.completed, self.expired_units
        ));
    }

    /// Force-finishes everything still pending. Expired tasks stay in
    /// [`units`](Self::units) so callers can inspect them.
    fn expire(&mut self) {
        let pending = self
            .units
            .iter_mut()
            .chain(self.prefix.iter_mut())
            .chain(self.postfix.iter_mut())
            .filter(|unit| !unit.is_finished());

        let mut abandoned = 0;
        for unit in pending {
            unit.force_finish();
            abandoned += 1;
        }

        self.expired_units += abandoned;
        self.expired = true;
        self.status = BatchStatus::Finished;
        self.sink.warn(
            Some(codes::BATCH_EXPIRED),
            &format!(
                "Batch [{}] reached EOL after {:?}, terminating {} task(s).",
                self.name, self.max_lifetime, abandoned
            ),
        );
    }

    /// Diagnostic label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lane the batch belongs to.
    pub fn queue(&self) -> QueueClass {
        self.queue
    }

    /// Number of tasks the batch was created with, barriers excluded.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of tasks not yet finished.
    pub fn remaining(&self) -> usize {
        self.units.iter().filter(|unit| !unit.is_finished()).count()
    }

    /// Tasks still held by the batch, in insertion order.
    ///
    /// Tasks that finished on their own have already been dropped.
    pub fn units(&self) -> &[Task] {
        &self.units
    }

    /// The prefix barrier, if any.
    pub fn prefix(&self) -> Option<&Task> {
        self.prefix.as_ref()
    }

    /// The postfix barrier, if any.
    pub fn postfix(&self) -> Option<&Task> {
        self.postfix.as_ref()
    }

    /// Current state.
    pub fn status(&self) -> BatchStatus {
        self.status
    }

    /// Returns `true` once the batch is finished.
    pub fn is_finished(&self) -> bool {
        self.status == BatchStatus::Finished
    }

    /// Returns `true` if the batch was terminated by its lifetime ceiling.
    pub fn was_expired(&self) -> bool {
        self.expired
    }

    /// Tasks whose callback reported completion.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Tasks finished by a lifetime ceiling, their own or the batch's.
    pub fn expired_units(&self) -> usize {
        self.expired_units
    }

    /// Lifetime ceiling, counted from the first update.
    pub fn max_lifetime(&self) -> Duration {
        self.max_lifetime
    }

    /// Clock time at which the batch was created.
    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    /// Time since the first update, or `None` if never updated.
    pub fn elapsed(&self) -> Option<Duration> {
        self.timer.elapsed()
    }
}

/// Polls a barrier and re-fires it while waiting. Returns `true` once it is
/// finished or absent.
fn advance_barrier(barrier: &mut Option<Task>) -> Result<bool, TaskError> {
    let Some(task) = barrier.as_mut() else {
        return Ok(true);
    };
    match task.poll() {
        TaskStatus::Finished => Ok(true),
        TaskStatus::Waiting => {
            task.execute()?;
            Ok(false)
        }
        TaskStatus::Processing => Ok(false),
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("name", &self.name)
            .field("queue", &self.queue)
            .field("status", &self.status)
            .field("size", &self.size)
            .field("remaining", &self.units.len())
            .field("max_lifetime", &self.max_lifetime)
            .finish_non_exhaustive()
    }
}
