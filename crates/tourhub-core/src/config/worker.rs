//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background dispatch worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether notification dispatch runs on the background worker.
    ///
    /// When disabled, dispatch runs inline on the calling task.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent dispatch tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Capacity of the in-process dispatch queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Seconds to wait for in-flight dispatches on shutdown.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_seconds: u64,
    /// Whether periodic maintenance jobs are scheduled.
    #[serde(default = "default_true")]
    pub scheduler_enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            queue_capacity: default_queue_capacity(),
            drain_timeout_seconds: default_drain_timeout(),
            scheduler_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_drain_timeout() -> u64 {
    30
}
