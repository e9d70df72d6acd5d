//! Notification delivery configuration.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// How failed sends are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryMode {
    /// Retries run synchronously right after the failed attempt.
    Inline,
    /// Retries are left to the periodic retry sweep.
    Deferred,
}

/// Notification retry, retention, and statistics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Maximum number of retries after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: i32,
    /// Whether retries run inline or from the retry sweep.
    #[serde(default = "default_retry_mode")]
    pub retry_mode: RetryMode,
    /// Age in days after which terminal notifications are deleted.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// Minutes after which an unsent PENDING notification is considered dead.
    #[serde(default = "default_stale_pending_minutes")]
    pub stale_pending_minutes: i64,
    /// Fixed UTC offset, in minutes, used to bucket the daily histogram.
    #[serde(default)]
    pub stats_utc_offset_minutes: i32,
    /// Maximum notifications retried per sweep run.
    #[serde(default = "default_retry_batch_size")]
    pub retry_batch_size: i64,
    /// Cron expression for the deferred retry sweep.
    #[serde(default = "default_retry_schedule")]
    pub retry_schedule: String,
    /// Cron expression for the stale PENDING sweep.
    #[serde(default = "default_stale_schedule")]
    pub stale_sweep_schedule: String,
    /// Cron expression for retention cleanup.
    #[serde(default = "default_cleanup_schedule")]
    pub cleanup_schedule: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_mode: default_retry_mode(),
            retention_days: default_retention_days(),
            stale_pending_minutes: default_stale_pending_minutes(),
            stats_utc_offset_minutes: 0,
            retry_batch_size: default_retry_batch_size(),
            retry_schedule: default_retry_schedule(),
            stale_sweep_schedule: default_stale_schedule(),
            cleanup_schedule: default_cleanup_schedule(),
        }
    }
}

impl NotificationConfig {
    /// The fixed timezone used to bucket statistics by calendar day.
    ///
    /// Falls back to UTC for offsets outside chrono's range; `AppConfig::validate`
    /// rejects those before they get here.
    pub fn stats_timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.stats_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}

fn default_max_retries() -> i32 {
    3
}

fn default_retry_mode() -> RetryMode {
    RetryMode::Inline
}

fn default_retention_days() -> i64 {
    90
}

fn default_stale_pending_minutes() -> i64 {
    30
}

fn default_retry_batch_size() -> i64 {
    100
}

fn default_retry_schedule() -> String {
    "0 */5 * * * *".to_string()
}

fn default_stale_schedule() -> String {
    "0 */10 * * * *".to_string()
}

fn default_cleanup_schedule() -> String {
    "0 30 3 * * *".to_string()
}
