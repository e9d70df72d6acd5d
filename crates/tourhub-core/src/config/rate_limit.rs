//! Rate limiting configuration.

use serde::{Deserialize, Serialize};

/// Token bucket settings for per-caller rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is applied.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Bucket capacity (burst size).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Tokens refilled per second.
    #[serde(default = "default_refill_per_second")]
    pub refill_per_second: f64,
    /// Maximum number of tracked callers.
    #[serde(default = "default_max_keys")]
    pub max_keys: u64,
    /// Seconds after which an idle caller's bucket is evicted.
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_tokens: default_max_tokens(),
            refill_per_second: default_refill_per_second(),
            max_keys: default_max_keys(),
            idle_ttl_seconds: default_idle_ttl(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    60
}

fn default_refill_per_second() -> f64 {
    1.0
}

fn default_max_keys() -> u64 {
    100_000
}

fn default_idle_ttl() -> u64 {
    600
}
