//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchedulerConfig {
    /// Per-node execution timeout in milliseconds
    #[serde(default = "default_node_timeout_ms")]
    pub node_timeout_ms: u64,

    /// Max nodes executing at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_node_timeout_ms() -> u64 {
    20_000
}

fn default_max_concurrent() -> usize {
    8
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            node_timeout_ms: default_node_timeout_ms(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl SchedulerConfig {
    /// Get the node timeout as a Duration
    pub fn node_timeout(&self) -> Duration {
        Duration::from_millis(self.node_timeout_ms)
    }

    /// Concurrency limit, never below one
    pub fn permits(&self) -> usize {
        self.max_concurrent.max(1)
    }
}
