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

//! [`DiagnosticSink`] implementations.

use log::Level;
use qtask_core::DiagnosticSink;
use std::sync::{Mutex, PoisonError};

/// Default log target for scheduler diagnostics.
pub const DEFAULT_TARGET: &str = "qtask";

/// Forwards diagnostics to the `log` facade.
///
/// Messages carrying a code are rendered as `"[CODE] message"`.
#[derive(Debug, Clone)]
pub struct LogSink {
    target: String,
}

impl LogSink {
    /// Creates a sink logging under [`DEFAULT_TARGET`].
    pub fn new() -> Self {
        Self::with_target(DEFAULT_TARGET)
    }

    /// Creates a sink logging under a custom target.
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Returns the log target.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for LogSink {
    fn emit(&self, level: Level, code: Option<&str>, message: &str) {
        match code {
            Some(code) => log::log!(target: self.target.as_str(), level, "[{code}] {message}"),
            None => log::log!(target: self.target.as_str(), level, "{message}"),
        }
    }

    fn enabled(&self, level: Level) -> bool {
        log::log_enabled!(target: self.target.as_str(), level)
    }
}

/// One message captured by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity.
    pub level: Level,
    /// Diagnostic code, if any.
    pub code: Option<String>,
    /// Message text.
    pub message: String,
}

/// Keeps every diagnostic in memory.
///
/// Meant for tests and for hosts that surface scheduler diagnostics in their
/// own UI.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Returns how many entries carry `code`.
    pub fn count_code(&self, code: &str) -> usize {
        self.lock()
            .iter()
            .filter(|e| e.code.as_deref() == Some(code))
            .count()
    }

    /// Returns how many entries were recorded at `level`.
    pub fn count_level(&self, level: Level) -> usize {
        self.lock().iter().filter(|e| e.level == level).count()
    }

    /// Returns the number of recorded entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every recorded entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        // Entries stay readable even if a recording thread panicked.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, level: Level, code: Option<&str>, message: &str) {
        self.lock().push(LogEntry {
            level,
            code: code.map(str::to_owned),
            message: message.to_owned(),
        });
    }
}
