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

// Usage: qtask-runtime [config.json]

mod config;
mod demo;
mod runtime;

use config::RuntimeConfig;
use runtime::Runtime;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    if let Err(err) = qtask_telemetry::init_logging("info") {
        eprintln!("Logger already initialised: {err}");
    }

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = RuntimeConfig::load(config_path.as_deref())?;
    log::info!("Runtime: configuration {config:?}");

    let mut runtime = Runtime::new(config)?;
    demo::enqueue(runtime.scheduler_mut());
    log::info!("Runtime: queued {} demo batch(es).", demo::BATCH_COUNT);

    runtime.run();

    let stats = runtime.scheduler().stats();
    log::info!(
        "Runtime: {} of {} batch(es) retired in {} tick(s).",
        stats.batches_finished,
        stats.batches_enqueued,
        runtime.ticks()
    );
    runtime.shutdown();
    Ok(())
}
