//! Built-in job handler implementations.

pub mod notification;

use std::sync::Arc;

use tourhub_core::config::NotificationConfig;
use tourhub_service::NotificationPipeline;

use crate::executor::JobExecutor;

pub use notification::{
    NotificationCleanupJobHandler, NotificationRetryJobHandler, StalePendingJobHandler,
    CLEANUP_JOB, RETRY_JOB, STALE_SWEEP_JOB,
};

/// An executor with every notification maintenance handler registered.
pub fn notification_executor(
    pipeline: &NotificationPipeline,
    config: &NotificationConfig,
) -> JobExecutor {
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(NotificationRetryJobHandler::new(
        Arc::clone(&pipeline.retry),
        config.retry_batch_size,
    )));
    executor.register(Arc::new(StalePendingJobHandler::new(
        Arc::clone(&pipeline.logger),
        config.stale_pending_minutes,
        config.retry_batch_size,
    )));
    executor.register(Arc::new(NotificationCleanupJobHandler::new(
        Arc::clone(&pipeline.logger),
        config.retention_days,
    )));
    executor
}
