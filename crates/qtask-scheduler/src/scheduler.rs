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

//! The tick-driven batch scheduler.

use crate::batch::{Batch, BatchStatus, QueueClass};
use crate::config::SchedulerConfig;
use crate::services::SchedulerServices;
use crate::task::Task;
use log::Level;
use qtask_core::ExecutionContext;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::fmt::Write as _;

/// Running totals kept by a [`TaskScheduler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    /// Batches accepted by [`TaskScheduler::enqueue_batch`].
    pub batches_enqueued: u64,
    /// Empty batches turned away.
    pub batches_rejected: u64,
    /// Batches that became current.
    pub batches_started: u64,
    /// Batches retired, expired ones included.
    pub batches_finished: u64,
    /// Batches terminated by their lifetime ceiling.
    pub batches_expired: u64,
    /// Tasks abandoned by a lifetime ceiling.
    pub units_expired: u64,
}

impl fmt::Display for SchedulerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batches enqueued={} rejected={} started={} finished={} expired={}, tasks expired={}",
            self.batches_enqueued,
            self.batches_rejected,
            self.batches_started,
            self.batches_finished,
            self.batches_expired,
            self.units_expired
        )
    }
}

/// Owns the batch queues and advances one batch per tick.
///
/// The primary lane is FIFO. The final lane is LIFO and only consulted once
/// the primary lane is empty. At most one batch is current at any time; a
/// finished batch is retired on the tick it finishes and the next batch only
/// starts on the following tick.
#[derive(Debug)]
pub struct TaskScheduler {
    config: SchedulerConfig,
    services: SchedulerServices,
    primary: VecDeque<Batch>,
    final_queue: Vec<Batch>,
    current: Option<Batch>,
    stats: SchedulerStats,
}

impl TaskScheduler {
    /// Creates an idle scheduler.
    pub fn new(config: SchedulerConfig, services: SchedulerServices) -> Self {
        log::info!(
            "TaskScheduler: created (task life {:?}, batch life {}..{} ms x{}).",
            config.unit_max_life(),
            config.batch_min_life_ms,
            config.batch_max_life_ms,
            config.batch_life_scale
        );
        Self {
            config,
            services,
            primary: VecDeque::new(),
            final_queue: Vec::new(),
            current: None,
            stats: SchedulerStats::default(),
        }
    }

    /// Runs one scheduling step. Call once per host tick.
    ///
    /// Picks the next batch if none is current, advances the current batch
    /// by one step, and retires it if that step finished it.
    ///
    /// ## Returns
    ///
    /// `true` if a batch was advanced, `false` if there was nothing to do.
    ///
    /// # Panics
    ///
    /// Panics if a task is bound to an invalid execution context. That is a
    /// caller bug, not a runtime condition.
    pub fn update(&mut self) -> bool {
        if self.current.is_none() {
            self.current = self.next_batch();
            if let Some(batch) = &self.current {
                self.stats.batches_started += 1;
                self.services.sink.debug(&format!(
                    "TaskScheduler: starting batch {}-{}:{}",
                    batch.queue().tag(),
                    batch.name(),
                    batch.size()
                ));
            }
        }

        let Some(batch) = self.current.as_mut() else {
            return false;
        };

        let status = match batch.update() {
            Ok(status) => status,
            Err(err) => panic!(
                "TaskScheduler: contract violation in batch [{}]: {err}",
                batch.name()
            ),
        };

        if status == BatchStatus::Finished {
            if let Some(batch) = self.current.take() {
                self.retire(&batch);
            }
        }
        true
    }

    fn next_batch(&mut self) -> Option<Batch> {
        self.primary
            .pop_front()
            .or_else(|| self.final_queue.pop())
    }

    fn retire(&mut self, batch: &Batch) {
        self.stats.batches_finished += 1;
        self.stats.units_expired += batch.expired_units() as u64;
        if batch.was_expired() {
            self.stats.batches_expired += 1;
        }
        self.services.sink.debug(&format!(
            "TaskScheduler: retired batch {}-{} ({} completed, {} expired)",
            batch.queue().tag(),
            batch.name(),
            batch.completed(),
            batch.expired_units()
        ));
    }

    /// Queues `batch` at the tail of its lane.
    ///
    /// ## Returns
    ///
    /// `false` if the batch holds no tasks and was dropped.
    pub fn enqueue_batch(&mut self, batch: Batch) -> bool {
        if batch.size() == 0 {
            self.stats.batches_rejected += 1;
            self.services.sink.debug(&format!(
                "TaskScheduler: ignoring empty batch [{}]",
                batch.name()
            ));
            return false;
        }

        match batch.queue() {
            QueueClass::Primary => self.primary.push_back(batch),
            QueueClass::Final => self.final_queue.push(batch),
        }
        self.stats.batches_enqueued += 1;
        true
    }

    /// Creates a task wired to this scheduler's services and task lifetime.
    pub fn create_task<F>(&self, context: ExecutionContext, callback: F) -> Task
    where
        F: FnMut() -> bool + Send + 'static,
    {
        Task::new(
            context,
            callback,
            &self.services,
            self.config.unit_max_life(),
        )
    }

    /// Creates a batch wired to this scheduler's services and batch lifetime.
    pub fn create_batch(
        &self,
        units: Vec<Task>,
        name: impl Into<String>,
        queue: QueueClass,
    ) -> Batch {
        Batch::new(units, name, queue, &self.services, &self.config)
    }

    /// Wraps a new task in a one-task batch and queues it.
    pub fn add_single_task<F>(
        &mut self,
        context: ExecutionContext,
        callback: F,
        name: impl Into<String>,
        queue: QueueClass,
    ) -> bool
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let task = self.create_task(context, callback);
        self.add_task(task, name, queue)
    }

    /// Wraps an existing task in a one-task batch and queues it.
    pub fn add_task(&mut self, task: Task, name: impl Into<String>, queue: QueueClass) -> bool {
        self.add_batch(vec![task], name, queue)
    }

    /// Builds a batch from `units` and queues it.
    pub fn add_batch(
        &mut self,
        units: Vec<Task>,
        name: impl Into<String>,
        queue: QueueClass,
    ) -> bool {
        let batch = self.create_batch(units, name, queue);
        self.enqueue_batch(batch)
    }

    /// Builds a batch bracketed by barrier tasks and queues it.
    pub fn add_batch_with_barriers(
        &mut self,
        units: Vec<Task>,
        prefix: Option<Task>,
        postfix: Option<Task>,
        name: impl Into<String>,
        queue: QueueClass,
    ) -> bool {
        let batch = Batch::with_barriers(
            units,
            prefix,
            postfix,
            name,
            queue,
            &self.services,
            &self.config,
        );
        self.enqueue_batch(batch)
    }

    /// Returns `true` while a batch is current.
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Returns `true` when there is no current batch and both lanes are empty.
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.primary.is_empty() && self.final_queue.is_empty()
    }

    /// Number of queued batches as `(primary, final)`, current excluded.
    pub fn queue_lengths(&self) -> (usize, usize) {
        (self.primary.len(), self.final_queue.len())
    }

    /// The batch being advanced, if any.
    pub fn current(&self) -> Option<&Batch> {
        self.current.as_ref()
    }

    /// Running totals.
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Lifetime settings used for new tasks and batches.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Host services shared with every task and batch.
    pub fn services(&self) -> &SchedulerServices {
        &self.services
    }

    /// Renders the queue state on one line, or one line per lane when
    /// `extended` is set. Final lane entries are listed in the order they
    /// will run.
    pub fn describe_queues(&self, extended: bool) -> String {
        let (primary, final_len) = self.queue_lengths();
        let mut out = format!("Task Scheduler Queues ({primary}+{final_len})");
        if let Some(batch) = &self.current {
            let _ = write!(out, " - Current: {}", label(batch));
        }

        if extended {
            if !self.primary.is_empty() {
                out.push_str("\n  ");
                out.push_str(&join_labels(self.primary.iter()));
            }
            if !self.final_queue.is_empty() {
                out.push_str("\n  ");
                out.push_str(&join_labels(self.final_queue.iter().rev()));
            }
        }
        out
    }

    /// Emits [`describe_queues`](Self::describe_queues) at debug level.
    pub fn log_queues(&self, extended: bool) {
        if self.services.sink.enabled(Level::Debug) {
            self.services.sink.debug(&self.describe_queues(extended));
        }
    }
}

fn label(batch: &Batch) -> String {
    format!("{}-{}:{}", batch.queue().tag(), batch.name(), batch.size())
}

fn join_labels<'a>(batches: impl Iterator<Item = &'a Batch>) -> String {
    batches.map(label).collect::<Vec<_>>().join(", ")
}
