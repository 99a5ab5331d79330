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

//! Runtime settings, loaded from an optional JSON file.

use anyhow::{ensure, Context as _};
use qtask_scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings for the host loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Ticks per second.
    pub tick_rate: u32,
    /// Threads serving the background context.
    pub background_workers: usize,
    /// Seconds between statistics summaries.
    pub summary_interval_secs: f64,
    /// Lifetime ceilings handed to the scheduler.
    pub scheduler: SchedulerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            background_workers: 2,
            summary_interval_secs: 5.0,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load a configuration from a JSON string and validate it.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse runtime configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid config '{}'", path.display()))
    }

    /// Reads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Checks that the loop settings are usable.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.tick_rate > 0, "tick_rate must be greater than zero");
        ensure!(
            self.summary_interval_secs.is_finite() && self.summary_interval_secs > 0.0,
            "summary_interval_secs must be positive, got {}",
            self.summary_interval_secs
        );
        self.scheduler.validate()?;
        Ok(())
    }

    /// Target duration of one tick.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_period(), Duration::from_secs(1) / 60);
    }

    #[test]
    fn test_nested_scheduler_overrides() {
        let config = RuntimeConfig::from_json(
            r#"{ "tick_rate": 120, "scheduler": { "unit_max_life_ms": 2000 } }"#,
        )
        .unwrap();

        assert_eq!(config.tick_rate, 120);
        assert_eq!(config.background_workers, 2);
        assert_eq!(config.scheduler.unit_max_life_ms, 2_000);
        assert_eq!(
            config.scheduler.batch_max_life_ms,
            SchedulerConfig::default().batch_max_life_ms
        );
    }

    #[test]
    fn test_rejects_zero_tick_rate() {
        let err = RuntimeConfig::from_json(r#"{ "tick_rate": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("tick_rate"));
    }

    #[test]
    fn test_rejects_invalid_scheduler_section() {
        let result =
            RuntimeConfig::from_json(r#"{ "scheduler": { "unit_max_life_ms": 0 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(RuntimeConfig::load(None).unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("runtime.json");
        std::fs::write(&path, r#"{ "background_workers": 4 }"#).unwrap();

        let config = RuntimeConfig::load(Some(&path)).unwrap();

        assert_eq!(config.background_workers, 4);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = RuntimeConfig::load(Some(&path)).unwrap_err();

        assert!(err.to_string().contains("missing.json"));
    }
}
