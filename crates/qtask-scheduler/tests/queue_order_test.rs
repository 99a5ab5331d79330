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

use qtask_core::{ExecutionContext, ManualClock};
use qtask_infra::InlineDispatcher;
use qtask_scheduler::{QueueClass, SchedulerConfig, SchedulerServices, TaskScheduler};
use qtask_telemetry::MemorySink;
use std::sync::{Arc, Mutex};

type RunLog = Arc<Mutex<Vec<String>>>;

fn inline_scheduler() -> TaskScheduler {
    let services = SchedulerServices::new(
        Arc::new(InlineDispatcher),
        Arc::new(MemorySink::new()),
        Arc::new(ManualClock::new()),
    );
    TaskScheduler::new(SchedulerConfig::default(), services)
}

fn add_recording(scheduler: &mut TaskScheduler, log: &RunLog, name: &str, queue: QueueClass) {
    let log = log.clone();
    let label = name.to_string();
    scheduler.add_single_task(
        ExecutionContext::Main,
        move || {
            log.lock().unwrap().push(label.clone());
            true
        },
        name,
        queue,
    );
}

fn run_to_idle(scheduler: &mut TaskScheduler) -> usize {
    let mut ticks = 0;
    while !scheduler.is_empty() {
        scheduler.update();
        ticks += 1;
        assert!(ticks < 1_000, "scheduler never went idle");
    }
    ticks
}

#[test]
fn test_primary_is_fifo_and_final_is_lifo() {
    // --- 1. Setup: interleave both lanes ---
    let mut scheduler = inline_scheduler();
    let log = RunLog::default();
    add_recording(&mut scheduler, &log, "P1", QueueClass::Primary);
    add_recording(&mut scheduler, &log, "F1", QueueClass::Final);
    add_recording(&mut scheduler, &log, "P2", QueueClass::Primary);
    add_recording(&mut scheduler, &log, "F2", QueueClass::Final);
    add_recording(&mut scheduler, &log, "F3", QueueClass::Final);

    // --- 2. Drain ---
    let ticks = run_to_idle(&mut scheduler);

    // --- 3. Verify ---
    assert_eq!(
        *log.lock().unwrap(),
        vec!["P1", "P2", "F3", "F2", "F1"],
        "Primary batches run first in FIFO order, then final batches in LIFO order"
    );
    assert_eq!(ticks, 10, "Each one-task batch takes two ticks");
    assert_eq!(scheduler.stats().batches_finished, 5);
}

#[test]
fn test_final_lane_waits_for_late_primary_work() {
    // --- 1. Setup ---
    let mut scheduler = inline_scheduler();
    let log = RunLog::default();
    add_recording(&mut scheduler, &log, "F1", QueueClass::Final);
    add_recording(&mut scheduler, &log, "F2", QueueClass::Final);

    // --- 2. Start F2, then queue primary work while it is current ---
    scheduler.update();
    assert_eq!(scheduler.current().map(|b| b.name()), Some("F2"));
    add_recording(&mut scheduler, &log, "P1", QueueClass::Primary);

    run_to_idle(&mut scheduler);

    // --- 3. Verify: the current batch is never preempted, but P1 jumps F1 ---
    assert_eq!(*log.lock().unwrap(), vec!["F2", "P1", "F1"]);
}

#[test]
fn test_empty_batches_never_reach_a_queue() {
    let mut scheduler = inline_scheduler();

    let accepted = scheduler.add_batch(Vec::new(), "nothing", QueueClass::Primary);
    let empty = scheduler.create_batch(Vec::new(), "nothing", QueueClass::Final);
    let enqueued = scheduler.enqueue_batch(empty);

    assert!(!accepted && !enqueued, "Empty batches must be rejected");
    assert_eq!(scheduler.queue_lengths(), (0, 0));
    assert!(scheduler.is_empty());
    assert!(!scheduler.update());
}

#[test]
fn test_end_to_end_two_unit_batch() {
    // --- 1. Setup: B1 with two units that complete on first invocation ---
    let mut scheduler = inline_scheduler();
    let u1 = scheduler.create_task(ExecutionContext::Main, || true);
    let u2 = scheduler.create_task(ExecutionContext::Main, || true);
    assert!(scheduler.add_batch(vec![u1, u2], "B1", QueueClass::Primary));

    // --- 2. Tick once: the batch starts ---
    assert!(scheduler.update());
    assert_eq!(scheduler.current().map(|b| b.name()), Some("B1"));

    // --- 3. Tick again: completion is observed and the batch retired ---
    assert!(scheduler.update());
    assert!(scheduler.current().is_none(), "B1 should be dequeued");
    assert!(scheduler.is_empty());
    assert_eq!(scheduler.stats().batches_finished, 1);
}
