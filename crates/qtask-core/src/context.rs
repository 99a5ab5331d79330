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

//! Logical execution contexts a deferred callback can be bound to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the logical thread or queue a task's callback must run on.
///
/// `None` exists so that an unbound task can be represented, but it is never
/// a valid target: dispatching to it is a contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExecutionContext {
    /// No context. Invalid at execution time.
    #[default]
    None,
    /// The host's main tick thread.
    Main,
    /// A background worker, off the tick thread.
    Background,
}

impl ExecutionContext {
    /// Returns `true` if a callback may be dispatched to this context.
    pub fn is_dispatchable(self) -> bool {
        !matches!(self, ExecutionContext::None)
    }

    /// Returns the short label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            ExecutionContext::None => "none",
            ExecutionContext::Main => "main",
            ExecutionContext::Background => "background",
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
