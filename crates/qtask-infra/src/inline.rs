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

use qtask_core::{Action, DispatchError, Dispatcher, ExecutionContext};

/// Runs every action immediately on the calling thread.
///
/// Suitable when the scheduler is ticked from the main thread and main-context
/// callbacks are short; the result is still delivered through the task's
/// mailbox and observed on the next scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl InlineDispatcher {
    /// Creates a new inline dispatcher.
    pub fn new() -> Self {
        Self
    }
}

impl Dispatcher for InlineDispatcher {
    fn run_on(&self, context: ExecutionContext, action: Action) -> Result<(), DispatchError> {
        if !context.is_dispatchable() {
            return Err(DispatchError::InvalidContext(context));
        }
        action();
        Ok(())
    }
}
