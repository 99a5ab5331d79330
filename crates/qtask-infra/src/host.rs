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

//! Routes each execution context to the lane that serves it.

use qtask_core::{Action, DispatchError, Dispatcher, ExecutionContext};
use std::sync::Arc;

/// A dispatcher that forwards `Main` and `Background` actions to two
/// underlying dispatchers.
#[derive(Clone)]
pub struct HostDispatcher {
    main: Arc<dyn Dispatcher>,
    background: Arc<dyn Dispatcher>,
}

impl HostDispatcher {
    /// Creates a router over a main-thread lane and a background lane.
    pub fn new(main: Arc<dyn Dispatcher>, background: Arc<dyn Dispatcher>) -> Self {
        Self { main, background }
    }
}

impl Dispatcher for HostDispatcher {
    fn run_on(&self, context: ExecutionContext, action: Action) -> Result<(), DispatchError> {
        match context {
            ExecutionContext::Main => self.main.run_on(context, action),
            ExecutionContext::Background => self.background.run_on(context, action),
            ExecutionContext::None => Err(DispatchError::InvalidContext(context)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackgroundWorker, MainThreadQueue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_routes_by_context() {
        let main = Arc::new(MainThreadQueue::new());
        let background = Arc::new(BackgroundWorker::new(1).unwrap());
        let host = HostDispatcher::new(main.clone(), background.clone());

        let main_hits = Arc::new(AtomicUsize::new(0));
        let m = main_hits.clone();
        host.run_on(
            ExecutionContext::Main,
            Box::new(move || {
                m.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        let (tx, rx) = crossbeam_channel::bounded(1);
        host.run_on(
            ExecutionContext::Background,
            Box::new(move || tx.send(()).unwrap()),
        )
        .unwrap();

        assert!(rx.recv_timeout(Duration::from_secs(1)).is_ok());
        assert_eq!(main.pending(), 1);
        assert_eq!(main_hits.load(Ordering::SeqCst), 0);

        main.drain();
        assert_eq!(main_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_none_is_invalid() {
        let host = HostDispatcher::new(
            Arc::new(MainThreadQueue::new()),
            Arc::new(crate::InlineDispatcher),
        );
        assert_eq!(
            host.run_on(ExecutionContext::None, Box::new(|| {})),
            Err(DispatchError::InvalidContext(ExecutionContext::None))
        );
    }
}
