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

//! Leveled diagnostic output with short lookup codes.
//!
//! Scheduler components receive a [`DiagnosticSink`] handle at construction
//! instead of reaching for a global logger. Output is for observability only
//! and never drives control flow.

use log::Level;

/// Short codes attached to scheduler diagnostics so they can be grepped in logs.
pub mod codes {
    /// A task exceeded its wall-clock ceiling and was force-finished.
    pub const TASK_EXPIRED: &str = "Q07";
    /// A batch exceeded its lifetime ceiling and was force-finished.
    pub const BATCH_EXPIRED: &str = "Q09";
    /// A task callback panicked.
    pub const CALLBACK_PANICKED: &str = "Q10";
    /// The lane serving a task's context is disconnected.
    pub const DISPATCH_DISCONNECTED: &str = "Q11";
    /// A task was bound to an invalid execution context.
    pub const INVALID_CONTEXT: &str = "MI77";
}

/// A sink accepting leveled messages with an optional diagnostic code.
pub trait DiagnosticSink: Send + Sync {
    /// Records one message.
    fn emit(&self, level: Level, code: Option<&str>, message: &str);

    /// Returns `true` if messages at `level` would be recorded.
    ///
    /// Lets callers skip building expensive debug strings.
    fn enabled(&self, level: Level) -> bool {
        let _ = level;
        true
    }

    /// Records a debug message.
    fn debug(&self, message: &str) {
        self.emit(Level::Debug, None, message);
    }

    /// Records an informational message.
    fn info(&self, code: Option<&str>, message: &str) {
        self.emit(Level::Info, code, message);
    }

    /// Records a warning.
    fn warn(&self, code: Option<&str>, message: &str) {
        self.emit(Level::Warn, code, message);
    }

    /// Records an error.
    fn error(&self, code: Option<&str>, message: &str) {
        self.emit(Level::Error, code, message);
    }
}
