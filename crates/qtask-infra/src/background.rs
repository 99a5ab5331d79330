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

//! A small pool of worker threads serving [`ExecutionContext::Background`].

use crossbeam_channel::{Receiver, Sender};
use qtask_core::{Action, DispatchError, Dispatcher, ExecutionContext};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};
use std::thread;

/// Runs background-context actions on dedicated worker threads.
///
/// Workers pull from one shared channel, so actions start in submission order
/// but may finish in any order. Dropping the worker (or calling
/// [`shutdown`](Self::shutdown)) lets queued actions finish, then joins.
pub struct BackgroundWorker {
    sender: Mutex<Option<Sender<Action>>>,
    handles: Mutex<Vec<thread::JoinHandle<()>>>,
    worker_count: usize,
}

impl BackgroundWorker {
    /// Spawns `worker_count` worker threads (at least one).
    ///
    /// # Errors
    ///
    /// Returns the OS error if a thread cannot be spawned.
    pub fn new(worker_count: usize) -> std::io::Result<Self> {
        let worker_count = worker_count.max(1);
        let (tx, rx) = crossbeam_channel::unbounded::<Action>();

        let mut handles = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("qtask-bg-{index}"))
                .spawn(move || worker_loop(index, rx))?;
            handles.push(handle);
        }

        log::info!("BackgroundWorker started with {worker_count} thread(s).");

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            handles: Mutex::new(handles),
            worker_count,
        })
    }

    /// Returns the number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Returns `true` until [`shutdown`](Self::shutdown) has been called.
    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stops accepting work, lets queued actions finish, and joins the workers.
    pub fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let handles: Vec<_> = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            if handle.join().is_err() {
                log::error!("BackgroundWorker: a worker thread terminated abnormally.");
            }
        }
        log::info!("BackgroundWorker stopped.");
    }
}

fn worker_loop(index: usize, rx: Receiver<Action>) {
    log::trace!("BackgroundWorker thread {index} started.");
    while let Ok(action) = rx.recv() {
        // Keep the worker alive if an action unwinds; the action owns its
        // own error reporting.
        if panic::catch_unwind(AssertUnwindSafe(action)).is_err() {
            log::error!("BackgroundWorker thread {index}: action panicked.");
        }
    }
    log::trace!("BackgroundWorker thread {index} stopped.");
}

impl Dispatcher for BackgroundWorker {
    fn run_on(&self, context: ExecutionContext, action: Action) -> Result<(), DispatchError> {
        if context != ExecutionContext::Background {
            return Err(DispatchError::InvalidContext(context));
        }
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DispatchError::Disconnected(context))?;
        sender
            .send(action)
            .map_err(|_| DispatchError::Disconnected(context))
    }
}

impl std::fmt::Debug for BackgroundWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundWorker")
            .field("worker_count", &self.worker_count)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for BackgroundWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
