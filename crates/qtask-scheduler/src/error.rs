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

//! Errors raised while executing tasks.

use qtask_core::ExecutionContext;
use std::fmt;

/// Contract violations surfaced by task execution.
///
/// Slow or failing callbacks are absorbed by the retry and lifetime paths and
/// never show up here; only caller bugs do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// A task was bound to a context no dispatcher serves.
    InvalidContext {
        /// The offending context.
        context: ExecutionContext,
    },
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::InvalidContext { context } => {
                write!(f, "Task called invalid execution context '{context}'")
            }
        }
    }
}

impl std::error::Error for TaskError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = TaskError::InvalidContext {
            context: ExecutionContext::None,
        };
        assert_eq!(err.to_string(), "Task called invalid execution context 'none'");
    }
}
