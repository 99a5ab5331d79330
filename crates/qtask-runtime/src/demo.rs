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

//! A sample workload exercising both lanes and both contexts.

use qtask_core::ExecutionContext;
use qtask_scheduler::{QueueClass, TaskScheduler};
use std::thread;
use std::time::Duration;

/// Number of batches [`enqueue`] adds.
pub const BATCH_COUNT: u64 = 4;

/// Queues the demo batches.
///
/// Two primary batches (multi-tick main-thread work, then background jobs
/// bracketed by main-thread barriers) followed by two final batches, which
/// run in reverse order of submission.
pub fn enqueue(scheduler: &mut TaskScheduler) {
    let warmup = (1..=3u32)
        .map(|id| {
            let mut step = 0;
            scheduler.create_task(ExecutionContext::Main, move || {
                step += 1;
                log::debug!("Demo: warmup {id} step {step}/{id}");
                step >= id
            })
        })
        .collect();
    scheduler.add_batch(warmup, "warmup", QueueClass::Primary);

    let jobs = (1..=2u64)
        .map(|id| {
            scheduler.create_task(ExecutionContext::Background, move || {
                thread::sleep(Duration::from_millis(25 * id));
                log::info!("Demo: background job {id} done");
                true
            })
        })
        .collect();
    let prepare = scheduler.create_task(ExecutionContext::Main, || {
        log::info!("Demo: preparing background jobs");
        true
    });
    let publish = scheduler.create_task(ExecutionContext::Main, || {
        log::info!("Demo: publishing background results");
        true
    });
    scheduler.add_batch_with_barriers(
        jobs,
        Some(prepare),
        Some(publish),
        "background-io",
        QueueClass::Primary,
    );

    scheduler.add_single_task(
        ExecutionContext::Main,
        || {
            log::info!("Demo: cleanup");
            true
        },
        "cleanup",
        QueueClass::Final,
    );
    scheduler.add_single_task(
        ExecutionContext::Background,
        || {
            log::info!("Demo: flushing");
            true
        },
        "flush",
        QueueClass::Final,
    );
}
