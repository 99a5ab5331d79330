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


//! # QTask Scheduler
//!
//! A cooperative, single-threaded scheduler for deferred work.
//!
//! Work is described as [`Task`]s (a callback bound to an
//! [`ExecutionContext`](qtask_core::ExecutionContext)), grouped into
//! [`Batch`]es, and queued on a [`TaskScheduler`]. The host calls
//! [`TaskScheduler::update`] once per tick; the scheduler advances exactly one
//! batch by one step per tick. Callbacks may run on other threads, but their
//! results are only ever applied on the tick thread.

#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod services;
pub mod task;

pub use batch::{Batch, BatchStatus, QueueClass};
pub use config::{ConfigError, SchedulerConfig};
pub use error::TaskError;
pub use scheduler::{SchedulerStats, TaskScheduler};
pub use services::SchedulerServices;
pub use task::{Task, TaskStatus};
