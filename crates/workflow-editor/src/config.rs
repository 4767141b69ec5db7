//! Configuration types for the editor and the simulated run driver

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::history::DEFAULT_HISTORY_LIMIT;

/// Default values
pub mod defaults {
    /// Pause before each node is started
    pub const STEP_DELAY_MS: u64 = 500;
    /// Shortest simulated processing time
    pub const MIN_PROCESSING_MS: u64 = 1000;
    /// Longest simulated processing time
    pub const MAX_PROCESSING_MS: u64 = 3000;
    /// Probability that a simulated step fails
    pub const FAILURE_RATE: f64 = 0.1;
    /// Pause between a failure and skipping the remaining nodes
    pub const SKIP_GRACE_MS: u64 = 300;
}

/// Graph store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Entries kept on each of the undo and redo stacks
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Timing and failure policy for simulated runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    pub step_delay_ms: u64,
    pub min_processing_ms: u64,
    pub max_processing_ms: u64,
    /// Probability in `[0, 1]` that a step fails
    pub failure_rate: f64,
    pub skip_grace_ms: u64,
    /// Seed for reproducible outcomes; entropy-seeded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: defaults::STEP_DELAY_MS,
            min_processing_ms: defaults::MIN_PROCESSING_MS,
            max_processing_ms: defaults::MAX_PROCESSING_MS,
            failure_rate: defaults::FAILURE_RATE,
            skip_grace_ms: defaults::SKIP_GRACE_MS,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the driver cannot honor
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(EditorError::invalid_config(format!(
                "failureRate must be within [0, 1], got {}",
                self.failure_rate
            )));
        }
        if self.min_processing_ms > self.max_processing_ms {
            return Err(EditorError::invalid_config(format!(
                "minProcessingMs ({}) exceeds maxProcessingMs ({})",
                self.min_processing_ms, self.max_processing_ms
            )));
        }
        Ok(())
    }

    /// Default timings with failure injection disabled
    pub fn never_fail() -> Self {
        Self {
            failure_rate: 0.0,
            ..Self::default()
        }
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn skip_grace(&self) -> Duration {
        Duration::from_millis(self.skip_grace_ms)
    }
}
