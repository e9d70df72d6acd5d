//! Bounded retries for FAILED notifications.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use tourhub_core::config::RetryMode;
use tourhub_core::types::NotificationId;
use tourhub_core::{AppError, AppResult};
use tourhub_entity::notification::{Notification, NotificationStatus};

use super::delivery::ChannelDelivery;
use super::logger::NotificationLogger;

/// Result of a retry request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "notification", rename_all = "snake_case")]
pub enum RetryOutcome {
    /// The retry reached the channel.
    Sent(Notification),
    /// The retry reached the channel and delivery was confirmed.
    Delivered(Notification),
    /// The retry failed again.
    Failed(Notification),
    /// The retry budget was already used up; nothing was attempted.
    Exhausted(Notification),
}

impl RetryOutcome {
    /// The record after the retry request.
    pub fn notification(&self) -> &Notification {
        match self {
            Self::Sent(n) | Self::Delivered(n) | Self::Failed(n) | Self::Exhausted(n) => n,
        }
    }

    /// Consume the outcome, keeping the record.
    pub fn into_notification(self) -> Notification {
        match self {
            Self::Sent(n) | Self::Delivered(n) | Self::Failed(n) | Self::Exhausted(n) => n,
        }
    }
}

/// Decides whether and how a FAILED record is retried.
///
/// Every attempt counts against the budget before the sender is called,
/// so `retry_count` is the number of retries made, never the number left.
#[derive(Debug, Clone)]
pub struct RetryCoordinator {
    logger: Arc<NotificationLogger>,
    delivery: Arc<ChannelDelivery>,
    max_retries: i32,
    mode: RetryMode,
}

impl RetryCoordinator {
    /// Create a coordinator.
    pub fn new(
        logger: Arc<NotificationLogger>,
        delivery: Arc<ChannelDelivery>,
        max_retries: i32,
        mode: RetryMode,
    ) -> Self {
        Self {
            logger,
            delivery,
            max_retries: max_retries.max(0),
            mode,
        }
    }

    /// Retry budget per record.
    pub fn max_retries(&self) -> i32 {
        self.max_retries
    }

    /// Retry one FAILED record now.
    ///
    /// Operator-initiated: permanent failures are retried too. Records that
    /// are not FAILED are a `Conflict`; a used-up budget is reported as
    /// [`RetryOutcome::Exhausted`] without touching the record.
    pub async fn retry(&self, id: NotificationId) -> AppResult<RetryOutcome> {
        let current = self.logger.get(id).await?;
        if current.status != NotificationStatus::Failed {
            return Err(AppError::conflict(format!(
                "Notification {id} is {}, only FAILED records can be retried",
                current.status
            )));
        }
        if current.retries_exhausted(self.max_retries) {
            warn!(
                notification_id = %id,
                retry_count = current.retry_count,
                max_retries = self.max_retries,
                "Retry budget exhausted"
            );
            return Ok(RetryOutcome::Exhausted(current));
        }

        let pending = self.logger.increment_retry(id, self.max_retries).await?;
        info!(
            notification_id = %id,
            channel = %pending.channel,
            retry_count = pending.retry_count,
            "Retrying notification"
        );
        let after = self.delivery.attempt(pending).await?;

        Ok(match after.status {
            NotificationStatus::Sent => RetryOutcome::Sent(after),
            NotificationStatus::Delivered => RetryOutcome::Delivered(after),
            _ => RetryOutcome::Failed(after),
        })
    }

    /// Apply the configured policy to a record that just failed.
    ///
    /// Inline mode retries synchronously until the record succeeds, fails
    /// permanently, or runs out of budget. Deferred mode leaves it for the
    /// retry sweep.
    pub async fn handle_failure(&self, failed: Notification) -> AppResult<Notification> {
        if self.mode == RetryMode::Deferred {
            return Ok(failed);
        }
        self.settle(failed).await
    }

    /// Retry while the record stays eligible for automatic retries.
    pub async fn settle(&self, mut current: Notification) -> AppResult<Notification> {
        while current.can_retry(self.max_retries) {
            current = self.retry(current.id).await?.into_notification();
        }
        if current.status == NotificationStatus::Failed {
            warn!(
                notification_id = %current.id,
                channel = %current.channel,
                retry_count = current.retry_count,
                error = current.error_message.as_deref().unwrap_or_default(),
                "Notification left FAILED"
            );
        }
        Ok(current)
    }

    /// Retry a batch of eligible FAILED records, one attempt each.
    ///
    /// Used by the deferred retry sweep. Returns how many records were
    /// attempted; individual errors are logged and skipped.
    pub async fn retry_due(&self, limit: i64) -> AppResult<usize> {
        let due = self.logger.retryable(self.max_retries, limit).await?;
        let mut attempted = 0;
        for n in due {
            match self.retry(n.id).await {
                Ok(RetryOutcome::Exhausted(_)) => {}
                Ok(_) => attempted += 1,
                Err(e) => warn!(notification_id = %n.id, error = %e, "Deferred retry skipped"),
            }
        }
        Ok(attempted)
    }
}
