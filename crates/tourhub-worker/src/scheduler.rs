//! Cron scheduler for periodic maintenance jobs.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, error, info, warn};

use tourhub_core::config::{NotificationConfig, RetryMode};
use tourhub_core::{AppError, AppResult};

use crate::executor::{JobExecutionError, JobExecutor};
use crate::jobs::{CLEANUP_JOB, RETRY_JOB, STALE_SWEEP_JOB};

/// Runs registered jobs on cron schedules.
pub struct CronScheduler {
    scheduler: JobScheduler,
    executor: Arc<JobExecutor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("job_types", &self.executor.registered_types())
            .finish()
    }
}

impl CronScheduler {
    /// Create a scheduler that runs jobs through `executor`.
    pub async fn new(executor: Arc<JobExecutor>) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;
        Ok(Self {
            scheduler,
            executor,
        })
    }

    /// Register the notification maintenance jobs.
    ///
    /// The retry sweep only runs in deferred retry mode; inline mode
    /// settles retries as part of the dispatch itself.
    pub async fn register_notification_jobs(&self, config: &NotificationConfig) -> AppResult<()> {
        if config.retry_mode == RetryMode::Deferred {
            self.register(RETRY_JOB, &config.retry_schedule).await?;
        }
        self.register(STALE_SWEEP_JOB, &config.stale_sweep_schedule)
            .await?;
        self.register(CLEANUP_JOB, &config.cleanup_schedule).await?;
        info!("All scheduled tasks registered");
        Ok(())
    }

    /// Run `job_type` on the six-field cron `schedule`.
    pub async fn register(&self, job_type: &str, schedule: &str) -> AppResult<()> {
        if !self.executor.has_handler(job_type) {
            return Err(AppError::configuration(format!(
                "No handler registered for job type '{job_type}'"
            )));
        }

        let executor = Arc::clone(&self.executor);
        let name = job_type.to_string();
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let name = name.clone();
            Box::pin(async move {
                debug!(job_type = %name, "Running scheduled job");
                match executor.execute(&name).await {
                    Ok(result) => info!(job_type = %name, result = %result, "Scheduled job finished"),
                    Err(JobExecutionError::Transient(msg)) => {
                        warn!(job_type = %name, error = %msg, "Scheduled job failed, will run again next tick");
                    }
                    Err(e) => error!(job_type = %name, error = %e, "Scheduled job failed"),
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid schedule '{schedule}' for {job_type}: {e}"
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add {job_type} schedule: {e}"))
        })?;

        info!(job_type, schedule, "Registered scheduled job");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;
        info!("Cron scheduler started");
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;
        info!("Cron scheduler shut down");
        Ok(())
    }
}
