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

//! The host loop: owns the execution lanes and ticks the scheduler.

use crate::config::RuntimeConfig;
use anyhow::Context as _;
use qtask_core::{Clock, MonotonicClock};
use qtask_infra::{BackgroundWorker, HostDispatcher, MainThreadQueue};
use qtask_scheduler::{SchedulerServices, TaskScheduler};
use qtask_telemetry::{LogSink, SummaryInterval};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Drives a [`TaskScheduler`] at a fixed tick rate.
///
/// The thread calling [`run`](Self::run) is the main execution context:
/// main-context callbacks queued by the scheduler run there, at the start of
/// each tick.
pub struct Runtime {
    config: RuntimeConfig,
    main_queue: Arc<MainThreadQueue>,
    background: Arc<BackgroundWorker>,
    scheduler: TaskScheduler,
    summary: SummaryInterval,
    ticks: u64,
    is_running: bool,
}

impl Runtime {
    /// Creates the execution lanes and an idle scheduler.
    ///
    /// # Errors
    ///
    /// Fails if the background worker threads cannot be spawned.
    pub fn new(config: RuntimeConfig) -> anyhow::Result<Self> {
        let main_queue = Arc::new(MainThreadQueue::new());
        let background = Arc::new(
            BackgroundWorker::new(config.background_workers)
                .context("Failed to start background workers")?,
        );
        let dispatcher = Arc::new(HostDispatcher::new(main_queue.clone(), background.clone()));

        let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::new());
        let services = SchedulerServices::new(dispatcher, Arc::new(LogSink::new()), clock.clone());
        let scheduler = TaskScheduler::new(config.scheduler.clone(), services);
        let summary = SummaryInterval::new(clock, config.summary_interval_secs);

        Ok(Self {
            config,
            main_queue,
            background,
            scheduler,
            summary,
            ticks: 0,
            is_running: false,
        })
    }

    /// The scheduler, for queuing work.
    pub fn scheduler_mut(&mut self) -> &mut TaskScheduler {
        &mut self.scheduler
    }

    /// The scheduler, for inspection.
    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    /// Ticks elapsed since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one tick: main-context work first, then one scheduler step.
    ///
    /// ## Returns
    ///
    /// `true` if the scheduler advanced a batch.
    pub fn tick(&mut self) -> bool {
        let ran = self.main_queue.drain();
        if ran > 0 {
            log::trace!("Runtime: ran {ran} main-thread action(s).");
        }

        let advanced = self.scheduler.update();
        self.ticks += 1;

        if self.summary.should_log_summary() {
            self.log_summary();
            self.summary.mark_summary_logged();
        }
        advanced
    }

    /// Ticks at the configured rate until the scheduler is idle.
    pub fn run(&mut self) {
        self.is_running = true;
        let period = self.config.tick_period();
        log::info!(
            "Runtime: starting main loop at {} Hz ({} background worker(s)).",
            self.config.tick_rate,
            self.background.worker_count()
        );

        while self.is_running && !self.scheduler.is_empty() {
            let started = Instant::now();
            self.tick();
            if let Some(rest) = period.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }

        self.is_running = false;
        log::info!("Runtime: scheduler idle after {} tick(s).", self.ticks);
        self.log_summary();
    }

    /// Stops the background workers. Queued background work is allowed to
    /// finish first.
    pub fn shutdown(&mut self) {
        self.is_running = false;
        self.background.shutdown();
        let leftover = self.main_queue.pending();
        if leftover > 0 {
            log::warn!("Runtime: discarding {leftover} abandoned main-thread action(s).");
        }
        log::info!("Runtime: shut down.");
    }

    fn log_summary(&self) {
        log::info!("Runtime: {}", self.scheduler.stats());
        self.scheduler.log_queues(true);
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.background.shutdown();
    }
}
