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

//! Lifetime ceilings for tasks and batches.

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// A task may stay unfinished for 20 seconds after its first execution.
pub const DEFAULT_UNIT_MAX_LIFE_MS: u64 = 20_000;
/// Each task in a batch adds 5 seconds to the batch lifetime.
pub const DEFAULT_BATCH_UNIT_BUDGET_MS: u64 = 5_000;
/// A batch always gets at least as long as a single task.
pub const DEFAULT_BATCH_MIN_LIFE_MS: u64 = DEFAULT_UNIT_MAX_LIFE_MS;
/// No batch may run longer than 5 minutes.
pub const DEFAULT_BATCH_MAX_LIFE_MS: u64 = 300_000;

/// Tuning for the scheduler's lifetime guards.
///
/// Every field has a default, so a JSON document only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Wall-clock ceiling for one task, measured from its first execution.
    pub unit_max_life_ms: u64,
    /// Per-task share of a batch's lifetime.
    pub batch_unit_budget_ms: u64,
    /// Lower bound of the batch lifetime.
    pub batch_min_life_ms: u64,
    /// Upper bound of the batch lifetime.
    pub batch_max_life_ms: u64,
    /// Factor applied to the clamped batch lifetime.
    pub batch_life_scale: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            unit_max_life_ms: DEFAULT_UNIT_MAX_LIFE_MS,
            batch_unit_budget_ms: DEFAULT_BATCH_UNIT_BUDGET_MS,
            batch_min_life_ms: DEFAULT_BATCH_MIN_LIFE_MS,
            batch_max_life_ms: DEFAULT_BATCH_MAX_LIFE_MS,
            batch_life_scale: 1.0,
        }
    }
}

impl SchedulerConfig {
    /// Load a configuration from a JSON string and validate it.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse scheduler configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        Self::from_json(&content)
    }

    /// Save the configuration to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        Ok(())
    }

    /// Checks that the ceilings are usable.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unit_max_life_ms == 0 {
            return Err(ConfigError::ZeroUnitLife);
        }
        if self.batch_min_life_ms > self.batch_max_life_ms {
            return Err(ConfigError::InvertedBatchBounds {
                min_ms: self.batch_min_life_ms,
                max_ms: self.batch_max_life_ms,
            });
        }
        if !self.batch_life_scale.is_finite() || self.batch_life_scale <= 0.0 {
            return Err(ConfigError::InvalidScale(self.batch_life_scale));
        }
        Ok(())
    }

    /// The wall-clock ceiling for a single task.
    pub fn unit_max_life(&self) -> Duration {
        Duration::from_millis(self.unit_max_life_ms)
    }

    /// The lifetime ceiling for a batch holding `unit_count` tasks.
    ///
    /// `clamp(unit_count * batch_unit_budget, min, max) * batch_life_scale`
    pub fn batch_lifetime(&self, unit_count: usize) -> Duration {
        let budget = self
            .batch_unit_budget_ms
            .saturating_mul(u64::try_from(unit_count).unwrap_or(u64::MAX));
        // max-then-min instead of `clamp` so inverted bounds cannot panic.
        let clamped = budget
            .max(self.batch_min_life_ms)
            .min(self.batch_max_life_ms);
        let base = Duration::from_millis(clamped);
        Duration::try_from_secs_f64(base.as_secs_f64() * self.batch_life_scale).unwrap_or(base)
    }
}

/// Reasons a [`SchedulerConfig`] is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `unit_max_life_ms` is zero, so every task would expire immediately.
    ZeroUnitLife,
    /// The batch lifetime floor is above its ceiling.
    InvertedBatchBounds {
        /// Configured floor.
        min_ms: u64,
        /// Configured ceiling.
        max_ms: u64,
    },
    /// The batch lifetime scale is not a positive finite number.
    InvalidScale(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroUnitLife => write!(f, "unit_max_life_ms must be greater than zero"),
            ConfigError::InvertedBatchBounds { min_ms, max_ms } => write!(
                f,
                "batch_min_life_ms ({min_ms}) must not exceed batch_max_life_ms ({max_ms})"
            ),
            ConfigError::InvalidScale(scale) => {
                write!(f, "batch_life_scale must be positive and finite, got {scale}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
