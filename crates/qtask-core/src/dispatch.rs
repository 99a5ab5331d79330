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

//! The dispatcher seam between the scheduler and the host's threads.
//!
//! The scheduler never owns threads. It hands each callback to a
//! [`Dispatcher`], which the host implements to run actions on its main tick
//! thread or on a background worker.

use crate::context::ExecutionContext;
use std::fmt;

/// A unit of code handed to a [`Dispatcher`].
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Runs actions on a logical execution context.
///
/// Implementations must not block the caller: `run_on` only queues the action
/// (or runs it inline if the caller already is on the target context).
pub trait Dispatcher: Send + Sync {
    /// Schedules `action` for execution on `context`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidContext`] when `context` cannot be
    /// served (always the case for [`ExecutionContext::None`]), and
    /// [`DispatchError::Disconnected`] when the lane serving it has shut down.
    fn run_on(&self, context: ExecutionContext, action: Action) -> Result<(), DispatchError>;
}

/// Errors raised when an action cannot be handed off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The context is not a valid dispatch target. This is a caller bug.
    InvalidContext(ExecutionContext),
    /// The lane serving the context is no longer accepting work.
    Disconnected(ExecutionContext),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::InvalidContext(context) => {
                write!(f, "Cannot dispatch to invalid execution context '{context}'")
            }
            DispatchError::Disconnected(context) => {
                write!(f, "Execution context '{context}' is no longer accepting work")
            }
        }
    }
}

impl std::error::Error for DispatchError {}
