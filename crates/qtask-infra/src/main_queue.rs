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

//! A queue of actions bound for the host's main tick thread.

use qtask_core::{Action, DispatchError, Dispatcher, ExecutionContext};

/// Collects [`ExecutionContext::Main`] actions until the host drains them.
///
/// Any thread may queue work; only the tick thread should call
/// [`drain`](Self::drain).
#[derive(Debug)]
pub struct MainThreadQueue {
    sender: flume::Sender<Action>,
    receiver: flume::Receiver<Action>,
}

impl MainThreadQueue {
    /// Creates an empty queue backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("MainThreadQueue initialized.");
        Self { sender, receiver }
    }

    /// Runs every action that was queued before this call.
    ///
    /// Actions queued while draining wait for the next call, so one drain
    /// is bounded even if actions re-queue themselves.
    ///
    /// ## Returns
    /// The number of actions executed.
    pub fn drain(&self) -> usize {
        let pending = self.receiver.len();
        let mut executed = 0;
        for _ in 0..pending {
            match self.receiver.try_recv() {
                Ok(action) => {
                    action();
                    executed += 1;
                }
                Err(_) => break,
            }
        }
        if executed > 0 {
            log::trace!("MainThreadQueue: executed {executed} action(s).");
        }
        executed
    }

    /// Returns the number of queued actions.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for MainThreadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for MainThreadQueue {
    fn run_on(&self, context: ExecutionContext, action: Action) -> Result<(), DispatchError> {
        if context != ExecutionContext::Main {
            return Err(DispatchError::InvalidContext(context));
        }
        // The queue owns its receiver, so the channel cannot be disconnected
        // while `self` is alive.
        self.sender
            .send(action)
            .map_err(|_| DispatchError::Disconnected(context))
    }
}
