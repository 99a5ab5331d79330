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

//! The unit of work: one deferred callback bound to an execution context.
//!
//! A [`Task`] never blocks the tick thread. [`Task::execute`] hands the
//! callback to the host [`Dispatcher`](qtask_core::Dispatcher); wherever the
//! callback runs, its result is posted to the task's mailbox and only applied
//! to [`TaskStatus`] when the tick thread calls [`Task::poll`]. The status
//! field is therefore never shared between threads.

use crate::error::TaskError;
use crate::services::SchedulerServices;
use qtask_core::diagnostics::codes;
use qtask_core::{Action, DispatchError, ExecutionContext, Stopwatch};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A task callback. Returns `true` once its work is complete, `false` to be
/// run again on a later tick.
pub type TaskCallback = Box<dyn FnMut() -> bool + Send + 'static>;

/// Lifecycle of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Ready to (re)start.
    Waiting,
    /// Handed to its execution context; no result observed yet.
    Processing,
    /// Completed or abandoned. Terminal.
    Finished,
}

/// What a callback invocation reported back through the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallbackOutcome {
    Complete,
    Pending,
}

/// A single deferred operation with bounded retry and lifetime.
pub struct Task {
    context: ExecutionContext,
    callback: Arc<Mutex<TaskCallback>>,
    status: TaskStatus,
    created_at: Duration,
    timer: Stopwatch,
    max_life: Duration,
    executions: u32,
    expired: bool,
    mailbox_tx: flume::Sender<CallbackOutcome>,
    mailbox_rx: flume::Receiver<CallbackOutcome>,
    services: SchedulerServices,
}

impl Task {
    /// Creates a waiting task.
    ///
    /// `max_life` is the wall-clock ceiling counted from the first
    /// [`execute`](Self::execute).
    pub fn new<F>(
        context: ExecutionContext,
        callback: F,
        services: &SchedulerServices,
        max_life: Duration,
    ) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (mailbox_tx, mailbox_rx) = flume::unbounded();
        Self {
            context,
            callback: Arc::new(Mutex::new(Box::new(callback))),
            status: TaskStatus::Waiting,
            created_at: services.clock.now(),
            timer: Stopwatch::idle(services.clock.clone()),
            max_life,
            executions: 0,
            expired: false,
            mailbox_tx,
            mailbox_rx,
            services: services.clone(),
        }
    }

    /// Hands the callback to its execution context.
    ///
    /// Sets the task to [`TaskStatus::Processing`] and returns without
    /// waiting for the callback. The result is applied by the next
    /// [`poll`](Self::poll). Calling this on a `Processing` task dispatches
    /// the callback again; invocations are serialised. A finished task is
    /// left untouched.
    ///
    /// If the task has outlived its ceiling it is force-finished instead of
    /// dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidContext`] when the task is bound to
    /// [`ExecutionContext::None`] or to a context the dispatcher does not serve.
    pub fn execute(&mut self) -> Result<(), TaskError> {
        if self.status == TaskStatus::Finished {
            return Ok(());
        }

        if !self.timer.is_running() {
            self.timer.start();
        } else if self.timer.exceeded(self.max_life) {
            self.expire();
            return Ok(());
        }

        if !self.context.is_dispatchable() {
            return Err(self.invalid_context(self.context));
        }

        let dispatched = self
            .services
            .dispatcher
            .run_on(self.context, self.completion_action());
        if let Err(DispatchError::InvalidContext(context)) = dispatched {
            return Err(self.invalid_context(context));
        }

        self.status = TaskStatus::Processing;
        self.executions += 1;

        if let Err(DispatchError::Disconnected(context)) = dispatched {
            // Left processing; the lifetime guard will release it.
            self.services.sink.error(
                Some(codes::DISPATCH_DISCONNECTED),
                &format!("Task could not be queued, '{context}' context is disconnected."),
            );
        }
        Ok(())
    }

    /// Applies any callback results delivered since the last poll, then
    /// enforces the lifetime ceiling.
    ///
    /// Must be called from the tick thread. Returns the resulting status.
    pub fn poll(&mut self) -> TaskStatus {
        if self.status == TaskStatus::Finished {
            return self.status;
        }

        for outcome in self.mailbox_rx.try_iter() {
            match outcome {
                CallbackOutcome::Complete => {
                    self.status = TaskStatus::Finished;
                    break;
                }
                CallbackOutcome::Pending => self.status = TaskStatus::Waiting,
            }
        }

        if self.status != TaskStatus::Finished && self.timer.exceeded(self.max_life) {
            self.expire();
        }
        self.status
    }

    /// Marks the task finished without waiting for its callback.
    ///
    /// Used when the owning batch runs out of time. A callback still running
    /// elsewhere is not interrupted; its result is discarded.
    pub fn force_finish(&mut self) {
        if self.status != TaskStatus::Finished {
            self.status = TaskStatus::Finished;
            self.expired = true;
        }
    }

    /// The execution context the callback runs on.
    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// The current status, as of the last [`poll`](Self::poll).
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns `true` once the task is finished.
    pub fn is_finished(&self) -> bool {
        self.status == TaskStatus::Finished
    }

    /// Returns `true` if the task was finished by a lifetime ceiling rather
    /// than by its callback.
    pub fn was_expired(&self) -> bool {
        self.expired
    }

    /// How many times the callback has been dispatched.
    pub fn executions(&self) -> u32 {
        self.executions
    }

    /// Clock time at which the task was created.
    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    /// Time since the first execution, or `None` if never executed.
    pub fn elapsed(&self) -> Option<Duration> {
        self.timer.elapsed()
    }

    /// The task's wall-clock ceiling.
    pub fn max_life(&self) -> Duration {
        self.max_life
    }

    fn expire(&mut self) {
        self.status = TaskStatus::Finished;
        self.expired = true;
        self.services.sink.warn(
            Some(codes::TASK_EXPIRED),
            &format!(
                "Task reached EOL after {:?} ({} execution(s)), terminating.",
                self.max_life, self.executions
            ),
        );
    }

    fn invalid_context(&self, context: ExecutionContext) -> TaskError {
        self.services.sink.error(
            Some(codes::INVALID_CONTEXT),
            &format!("Task called invalid thread '{context}'!"),
        );
        TaskError::InvalidContext { context }
    }

    /// Builds the action that runs the callback and posts its outcome.
    fn completion_action(&self) -> Action {
        let callback = Arc::clone(&self.callback);
        let mailbox = self.mailbox_tx.clone();
        let sink = Arc::clone(&self.services.sink);

        Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                let mut callback = callback.lock().unwrap_or_else(PoisonError::into_inner);
                (*callback)()
            }));

            let outcome = match result {
                Ok(true) => CallbackOutcome::Complete,
                Ok(false) => CallbackOutcome::Pending,
                Err(payload) => {
                    sink.error(
                        Some(codes::CALLBACK_PANICKED),
                        &format!("Task callback panicked: {}", panic_message(payload.as_ref())),
                    );
                    return;
                }
            };
            // The task may already be gone (force-finished and dropped).
            let _ = mailbox.send(outcome);
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("context", &self.context)
            .field("status", &self.status)
            .field("executions", &self.executions)
            .field("created_at", &self.created_at)
            .field("expired", &self.expired)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use qtask_core::{Clock, Dispatcher, ManualClock};
    use qtask_infra::{InlineDispatcher, MainThreadQueue};
    use qtask_telemetry::MemorySink;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Harness {
        clock: Arc<ManualClock>,
        sink: Arc<MemorySink>,
        services: SchedulerServices,
    }

    fn harness(dispatcher: Arc<dyn Dispatcher>) -> Harness {
        let clock = Arc::new(ManualClock::new());
        let sink = Arc::new(MemorySink::new());
        let services = SchedulerServices::new(dispatcher, sink.clone(), clock.clone());
        Harness {
            clock,
            sink,
            services,
        }
    }

    fn inline() -> Harness {
        harness(Arc::new(InlineDispatcher))
    }

    const LIFE: Duration = Duration::from_secs(20);

    #[test]
    fn test_new_task_is_waiting() {
        let h = inline();
        h.clock.advance(Duration::from_secs(3));
        let task = Task::new(ExecutionContext::Main, || true, &h.services, LIFE);

        assert_eq!(task.status(), TaskStatus::Waiting);
        assert_eq!(task.executions(), 0);
        assert_eq!(task.created_at(), Duration::from_secs(3));
        assert!(task.elapsed().is_none());
    }

    #[test]
    fn test_completion_is_applied_on_poll() {
        let h = inline();
        let mut task = Task::new(ExecutionContext::Main, || true, &h.services, LIFE);

        task.execute().unwrap();
        // The inline callback already ran, but its result is still in the mailbox.
        assert_eq!(task.status(), TaskStatus::Processing);

        assert_eq!(task.poll(), TaskStatus::Finished);
        assert!(!task.was_expired());
    }

    #[test]
    fn test_retry_until_complete() {
        let h = inline();
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let mut task = Task::new(
            ExecutionContext::Main,
            move || c.fetch_add(1, Ordering::SeqCst) + 1 >= 3,
            &h.services,
            LIFE,
        );

        let mut trace = vec![task.status()];
        for _ in 0..3 {
            task.execute().unwrap();
            trace.push(task.status());
            trace.push(task.poll());
        }

        assert_eq!(
            trace,
            vec![
                TaskStatus::Waiting,
                TaskStatus::Processing,
                TaskStatus::Waiting,
                TaskStatus::Processing,
                TaskStatus::Waiting,
                TaskStatus::Processing,
                TaskStatus::Finished,
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(task.executions(), 3);
    }

    #[test]
    fn test_finished_is_terminal() {
        let h = inline();
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let mut task = Task::new(
            ExecutionContext::Main,
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                true
            },
            &h.services,
            LIFE,
        );
        task.execute().unwrap();
        task.poll();

        task.execute().unwrap();
        h.clock.advance(LIFE * 2);
        assert_eq!(task.poll(), TaskStatus::Finished);
        task.force_finish();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!task.was_expired());
        assert!(h.sink.is_empty());
    }

    #[test]
    fn test_status_stays_processing_until_main_queue_drains() {
        let queue = Arc::new(MainThreadQueue::new());
        let h = harness(queue.clone());
        let mut task = Task::new(ExecutionContext::Main, || true, &h.services, LIFE);

        task.execute().unwrap();
        assert_eq!(task.poll(), TaskStatus::Processing);

        queue.drain();
        assert_eq!(task.poll(), TaskStatus::Finished);
    }

    #[test]
    fn test_stuck_task_expires_on_poll() {
        let queue = Arc::new(MainThreadQueue::new());
        let h = harness(queue);
        let mut task = Task::new(ExecutionContext::Main, || true, &h.services, LIFE);

        task.execute().unwrap();
        h.clock.advance(LIFE);
        assert_eq!(task.poll(), TaskStatus::Processing);

        h.clock.advance(Duration::from_millis(1));
        assert_eq!(task.poll(), TaskStatus::Finished);
        assert!(task.was_expired());
        assert_eq!(h.sink.count_code(codes::TASK_EXPIRED), 1);
    }

    #[test]
    fn test_execute_after_ceiling_expires_without_dispatch() {
        let h = inline();
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let mut task = Task::new(
            ExecutionContext::Main,
            move || {
                c.fetch_add(1, Ordering::SeqCst);
                false
            },
            &h.services,
            LIFE,
        );

        task.execute().unwrap();
        task.poll();
        h.clock.advance(LIFE + Duration::from_secs(1));
        task.execute().unwrap();

        assert_eq!(task.status(), TaskStatus::Finished);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.sink.count_level(Level::Warn), 1);
    }

    #[test]
    fn test_lifetime_counts_from_first_execute() {
        let h = inline();
        let mut task = Task::new(ExecutionContext::Main, || false, &h.services, LIFE);

        h.clock.advance(LIFE * 3);
        task.execute().unwrap();

        assert_eq!(task.poll(), TaskStatus::Waiting);
        assert_eq!(task.elapsed(), Some(Duration::ZERO));
    }

    #[test]
    fn test_none_context_is_a_contract_violation() {
        let h = inline();
        let mut task = Task::new(ExecutionContext::None, || true, &h.services, LIFE);

        let err = task.execute().unwrap_err();

        assert_eq!(
            err,
            TaskError::InvalidContext {
                context: ExecutionContext::None
            }
        );
        assert_eq!(task.executions(), 0);
        assert_eq!(h.sink.count_code(codes::INVALID_CONTEXT), 1);
    }

    #[test]
    fn test_unserved_context_is_a_contract_violation() {
        let h = harness(Arc::new(MainThreadQueue::new()));
        let mut task = Task::new(ExecutionContext::Background, || true, &h.services, LIFE);

        assert!(task.execute().is_err());
        assert_eq!(h.sink.count_code(codes::INVALID_CONTEXT), 1);
    }

    #[test]
    fn test_panicking_callback_is_logged_and_left_processing() {
        let h = inline();
        let mut task = Task::new(
            ExecutionContext::Main,
            || panic!("callback exploded"),
            &h.services,
            LIFE,
        );

        task.execute().unwrap();

        assert_eq!(task.poll(), TaskStatus::Processing);
        let entries = h.sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].code.as_deref(), Some(codes::CALLBACK_PANICKED));
        assert!(entries[0].message.contains("callback exploded"));

        h.clock.advance(LIFE + Duration::from_millis(1));
        assert_eq!(task.poll(), TaskStatus::Finished);
        assert!(task.was_expired());
    }

    #[test]
    fn test_force_finish_marks_expired_silently() {
        let h = inline();
        let mut task = Task::new(ExecutionContext::Main, || false, &h.services, LIFE);
        task.force_finish();

        assert!(task.is_finished());
        assert!(task.was_expired());
        assert!(h.sink.is_empty());
    }

    #[test]
    fn test_clock_is_shared_with_services() {
        let h = inline();
        h.clock.advance(Duration::from_secs(1));
        assert_eq!(h.services.clock.now(), Duration::from_secs(1));
    }
}
