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

//! # QTask Core
//!
//! Foundational crate containing the contracts shared by the deferred task
//! scheduler and the host that drives it: execution contexts, the dispatcher
//! seam, the diagnostic sink, and the time sources used for lifetime ceilings.

#![warn(missing_docs)]

pub mod context;
pub mod diagnostics;
pub mod dispatch;
pub mod utils;

pub use context::ExecutionContext;
pub use diagnostics::DiagnosticSink;
pub use dispatch::{Action, DispatchError, Dispatcher};
pub use utils::clock::{Clock, ManualClock, MonotonicClock};
pub use utils::timer::Stopwatch;
