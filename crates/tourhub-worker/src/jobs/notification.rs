//! Notification maintenance jobs: deferred retries, stale PENDING sweep,
//! and retention cleanup.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;
use tracing::info;

use tourhub_core::{AppError, ErrorKind};
use tourhub_service::{NotificationLogger, RetryCoordinator};

use crate::executor::{JobExecutionError, JobHandler};

/// Job type of the deferred retry sweep.
pub const RETRY_JOB: &str = "notification_retry";
/// Job type of the stale PENDING sweep.
pub const STALE_SWEEP_JOB: &str = "notification_stale_sweep";
/// Job type of the retention cleanup.
pub const CLEANUP_JOB: &str = "notification_cleanup";

fn job_error(err: AppError) -> JobExecutionError {
    match err.kind {
        ErrorKind::Database | ErrorKind::ServiceUnavailable => {
            JobExecutionError::Transient(err.to_string())
        }
        ErrorKind::Validation | ErrorKind::Configuration => {
            JobExecutionError::Permanent(err.to_string())
        }
        _ => JobExecutionError::Internal(err),
    }
}

/// Retries FAILED notifications that are still within their retry budget.
#[derive(Debug)]
pub struct NotificationRetryJobHandler {
    retry: Arc<RetryCoordinator>,
    batch_size: i64,
}

impl NotificationRetryJobHandler {
    /// Create a retry sweep handler.
    pub fn new(retry: Arc<RetryCoordinator>, batch_size: i64) -> Self {
        Self { retry, batch_size }
    }
}

#[async_trait]
impl JobHandler for NotificationRetryJobHandler {
    fn job_type(&self) -> &str {
        RETRY_JOB
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let attempted = self
            .retry
            .retry_due(self.batch_size)
            .await
            .map_err(job_error)?;
        info!(attempted, "Deferred notification retries finished");
        Ok(serde_json::json!({
            "task": RETRY_JOB,
            "attempted": attempted,
            "max_retries": self.retry.max_retries(),
        }))
    }
}

/// Fails PENDING notifications that were never sent.
#[derive(Debug)]
pub struct StalePendingJobHandler {
    logger: Arc<NotificationLogger>,
    max_age_minutes: i64,
    batch_size: i64,
}

impl StalePendingJobHandler {
    /// Create a stale sweep handler.
    pub fn new(logger: Arc<NotificationLogger>, max_age_minutes: i64, batch_size: i64) -> Self {
        Self {
            logger,
            max_age_minutes,
            batch_size,
        }
    }
}

#[async_trait]
impl JobHandler for StalePendingJobHandler {
    fn job_type(&self) -> &str {
        STALE_SWEEP_JOB
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        if self.max_age_minutes <= 0 {
            return Err(JobExecutionError::Permanent(format!(
                "stale_pending_minutes must be positive, got {}",
                self.max_age_minutes
            )));
        }
        let failed = self
            .logger
            .sweep_stale_pending(Duration::minutes(self.max_age_minutes), self.batch_size)
            .await
            .map_err(job_error)?;
        Ok(serde_json::json!({
            "task": STALE_SWEEP_JOB,
            "failed": failed.len(),
            "max_age_minutes": self.max_age_minutes,
        }))
    }
}

/// Deletes old DELIVERED and FAILED notifications.
#[derive(Debug)]
pub struct NotificationCleanupJobHandler {
    logger: Arc<NotificationLogger>,
    retention_days: i64,
}

impl NotificationCleanupJobHandler {
    /// Create a retention cleanup handler.
    pub fn new(logger: Arc<NotificationLogger>, retention_days: i64) -> Self {
        Self {
            logger,
            retention_days,
        }
    }
}

#[async_trait]
impl JobHandler for NotificationCleanupJobHandler {
    fn job_type(&self) -> &str {
        CLEANUP_JOB
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let deleted = self
            .logger
            .cleanup(self.retention_days)
            .await
            .map_err(job_error)?;
        Ok(serde_json::json!({
            "task": CLEANUP_JOB,
            "deleted": deleted,
            "retention_days": self.retention_days,
        }))
    }
}
