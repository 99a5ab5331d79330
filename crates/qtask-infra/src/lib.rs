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


//! # QTask Infra
//!
//! Concrete implementations of the [`Dispatcher`](qtask_core::Dispatcher)
//! contract that a host wires into the scheduler.

#![warn(missing_docs)]

pub mod background;
pub mod host;
pub mod inline;
pub mod main_queue;

pub use background::BackgroundWorker;
pub use host::HostDispatcher;
pub use inline::InlineDispatcher;
pub use main_queue::MainThreadQueue;
