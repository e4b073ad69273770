//! Runner configuration.
//!
//! This module defines configuration options for the reference driver:
//! parallelism, failure policy and observability switches.

use genoflow_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Configuration for [`NetRunner`](super::NetRunner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Maximum number of firings in flight at once.
    ///
    /// Default: number of logical CPUs
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Stop the run at the first Job failure.
    ///
    /// When set, the first failure resets the execution context (cancelling
    /// every in-flight firing) and the run returns the error. Otherwise
    /// failures are reported and unrelated branches keep running.
    ///
    /// Default: false
    #[serde(default)]
    pub fail_fast: bool,

    /// Record per-transition firing times into the `fire.elapsed_ms`
    /// context annotation.
    ///
    /// Default: true
    #[serde(default = "default_record_timings")]
    pub record_timings: bool,

    /// Install a `tracing-subscriber` fmt subscriber when the runner is
    /// created. Ignored if a global subscriber is already set.
    ///
    /// Default: false
    #[serde(default)]
    pub enable_tracing: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            fail_fast: false,
            record_timings: default_record_timings(),
            enable_tracing: false,
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("Invalid runner config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_record_timings(mut self, record_timings: bool) -> Self {
        self.record_timings = record_timings;
        self
    }

    pub fn with_tracing(mut self, enable_tracing: bool) -> Self {
        self.enable_tracing = enable_tracing;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_concurrency == 0 {
            return Err(EngineError::Config(
                "max_concurrency must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// Default functions for serde
fn default_max_concurrency() -> usize {
    num_cpus::get().max(1)
}

fn default_record_timings() -> bool {
    true
}
