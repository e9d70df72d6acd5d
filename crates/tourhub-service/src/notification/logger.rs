//! Notification lifecycle bookkeeping, queries, and statistics.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use tracing::{debug, info, warn};

use tourhub_core::types::{NotificationId, PageRequest, PageResponse};
use tourhub_core::{AppError, AppResult, ErrorKind};
use tourhub_database::store::NotificationStore;
use tourhub_entity::notification::{
    NewNotification, Notification, NotificationFilter, NotificationStats, NotificationStatus,
};

/// Error recorded on PENDING records abandoned by the stale sweep.
pub const STALE_PENDING_ERROR: &str = "delivery timed out";

/// Owns every write to the notification log.
///
/// Status changes are validated against the state machine in memory and
/// then written with a compare-and-set on the previous status, so a
/// concurrent writer that got there first turns this write into a
/// `Conflict` instead of being overwritten.
#[derive(Debug, Clone)]
pub struct NotificationLogger {
    store: Arc<dyn NotificationStore>,
    stats_tz: FixedOffset,
}

impl NotificationLogger {
    /// Create a logger; `stats_tz` buckets the daily histogram.
    pub fn new(store: Arc<dyn NotificationStore>, stats_tz: FixedOffset) -> Self {
        Self { store, stats_tz }
    }

    /// Record a new PENDING notification.
    pub async fn log(&self, new: NewNotification) -> AppResult<Notification> {
        let notification = Notification::from_new(new, Utc::now());
        let stored = self.store.insert(&notification).await?;
        debug!(
            notification_id = %stored.id,
            user_id = %stored.user_id,
            channel = %stored.channel,
            notification_type = %stored.notification_type,
            "Notification logged"
        );
        Ok(stored)
    }

    /// Load one record.
    pub async fn get(&self, id: NotificationId) -> AppResult<Notification> {
        self.store.get(id).await
    }

    /// Move a record to `status`. FAILED needs `error_message`.
    pub async fn update_status(
        &self,
        id: NotificationId,
        status: NotificationStatus,
        error_message: Option<String>,
    ) -> AppResult<Notification> {
        self.transition(id, |n, now| n.apply_transition(status, error_message, now))
            .await
    }

    /// Move a record to FAILED; `retryable = false` keeps automatic retries away.
    pub async fn record_failure(
        &self,
        id: NotificationId,
        error_message: String,
        retryable: bool,
    ) -> AppResult<Notification> {
        self.transition(id, |n, now| {
            n.apply_transition(NotificationStatus::Failed, Some(error_message), now)?;
            if !retryable {
                n.mark_permanent();
            }
            Ok(())
        })
        .await
    }

    /// Count a retry attempt and move the record from FAILED back to PENDING.
    pub async fn increment_retry(
        &self,
        id: NotificationId,
        max_retries: i32,
    ) -> AppResult<Notification> {
        self.transition(id, |n, now| n.begin_retry(max_retries, now))
            .await
    }

    async fn transition<F>(&self, id: NotificationId, apply: F) -> AppResult<Notification>
    where
        F: FnOnce(&mut Notification, DateTime<Utc>) -> AppResult<()>,
    {
        let current = self.store.get(id).await?;
        let expected = current.status;
        let mut next = current;
        apply(&mut next, Utc::now())?;

        let stored = self
            .store
            .compare_and_set(expected, &next)
            .await?
            .ok_or_else(|| {
                AppError::conflict(format!(
                    "Notification {id} changed while moving from {expected}"
                ))
            })?;

        debug!(
            notification_id = %id,
            from = %expected,
            to = %stored.status,
            retry_count = stored.retry_count,
            "Notification status updated"
        );
        Ok(stored)
    }

    /// One page of records matching `filter`, newest first.
    pub async fn query(
        &self,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let (items, total) = self.store.query(filter, page).await?;
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    /// Delivery statistics over records matching `filter`.
    pub async fn stats(&self, filter: &NotificationFilter) -> AppResult<NotificationStats> {
        self.stats_at(filter, Utc::now()).await
    }

    /// Statistics with the histogram ending on the local day of `now`.
    pub async fn stats_at(
        &self,
        filter: &NotificationFilter,
        now: DateTime<Utc>,
    ) -> AppResult<NotificationStats> {
        let rows = self.store.status_counts(filter, self.stats_tz).await?;
        let today = now.with_timezone(&self.stats_tz).date_naive();
        Ok(NotificationStats::from_rows(&rows, today))
    }

    /// Delete DELIVERED and FAILED records older than `retention_days`.
    ///
    /// PENDING and SENT records are kept regardless of age.
    pub async fn cleanup(&self, retention_days: i64) -> AppResult<u64> {
        if retention_days <= 0 {
            return Err(AppError::validation(format!(
                "Retention must be at least one day, got {retention_days}"
            )));
        }
        let cutoff = Utc::now() - Duration::days(retention_days);
        let deleted = self.store.delete_terminal_before(cutoff).await?;
        info!(deleted, retention_days, %cutoff, "Notification retention cleanup finished");
        Ok(deleted)
    }

    /// Fail PENDING records that were never sent and have not moved for `max_age`.
    ///
    /// Records that change underneath the sweep are left alone.
    pub async fn sweep_stale_pending(
        &self,
        max_age: Duration,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let cutoff = Utc::now() - max_age;
        let stale = self.store.find_stale_pending(cutoff, limit).await?;

        let mut failed = Vec::with_capacity(stale.len());
        for record in stale {
            match self
                .update_status(
                    record.id,
                    NotificationStatus::Failed,
                    Some(STALE_PENDING_ERROR.to_string()),
                )
                .await
            {
                Ok(n) => {
                    warn!(
                        notification_id = %n.id,
                        channel = %n.channel,
                        "Stale PENDING notification marked failed"
                    );
                    failed.push(n);
                }
                Err(e) if e.kind == ErrorKind::Conflict => {
                    debug!(notification_id = %record.id, "Stale record moved before sweep");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(failed)
    }

    /// FAILED records eligible for an automatic retry.
    pub async fn retryable(&self, max_retries: i32, limit: i64) -> AppResult<Vec<Notification>> {
        self.store.find_retryable(max_retries, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourhub_core::types::UserId;
    use tourhub_database::memory::MemoryNotificationStore;
    use tourhub_entity::notification::{
        NotificationChannel, NotificationPayload, NotificationPriority,
    };

    fn logger(store: &MemoryNotificationStore) -> NotificationLogger {
        NotificationLogger::new(Arc::new(store.clone()), FixedOffset::east_opt(0).unwrap())
    }

    fn new_notification(channel: NotificationChannel) -> NewNotification {
        NewNotification {
            user_id: UserId::new(),
            order_id: None,
            channel,
            priority: NotificationPriority::Normal,
            title: "Title".into(),
            content: "Body".into(),
            metadata: NotificationPayload::SystemAnnouncement { link: None },
        }
    }

    #[tokio::test]
    async fn test_lifecycle_through_logger() {
        let store = MemoryNotificationStore::new();
        let logger = logger(&store);
        let n = logger.log(new_notification(NotificationChannel::Email)).await.unwrap();

        let err = logger
            .update_status(n.id, NotificationStatus::Delivered, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let sent = logger
            .update_status(n.id, NotificationStatus::Sent, None)
            .await
            .unwrap();
        assert!(sent.sent_at.is_some());
        let delivered = logger
            .update_status(n.id, NotificationStatus::Delivered, None)
            .await
            .unwrap();
        assert_eq!(delivered.sent_at, sent.sent_at);
        assert!(delivered.delivered_at.is_some());
    }

    #[tokio::test]
    async fn test_retry_bookkeeping() {
        let store = MemoryNotificationStore::new();
        let logger = logger(&store);
        let n = logger.log(new_notification(NotificationChannel::Sms)).await.unwrap();

        let failed = logger
            .record_failure(n.id, "no route".into(), false)
            .await
            .unwrap();
        assert!(!failed.retryable);
        assert!(logger.retryable(3, 10).await.unwrap().is_empty());

        let retried = logger.increment_retry(n.id, 3).await.unwrap();
        assert_eq!(retried.retry_count, 1);
        assert_eq!(retried.status, NotificationStatus::Pending);
        assert!(retried.error_message.is_none());
    }

    #[tokio::test]
    async fn test_stats_on_empty_log() {
        let store = MemoryNotificationStore::new();
        let stats = logger(&store)
            .stats(&NotificationFilter::default())
            .await
            .unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.overall.delivery_rate, 0.0);
        assert_eq!(stats.daily.len(), 7);
    }

    #[tokio::test]
    async fn test_cleanup_rejects_non_positive_retention() {
        let store = MemoryNotificationStore::new();
        assert!(logger(&store).cleanup(0).await.is_err());
    }

    #[tokio::test]
    async fn test_stale_sweep() {
        let store = MemoryNotificationStore::new();
        let logger = logger(&store);
        let n = logger.log(new_notification(NotificationChannel::Push)).await.unwrap();

        let mut aged = store.get(n.id).await.unwrap();
        aged.updated_at = Utc::now() - Duration::hours(2);
        store.put(aged).await;
        let fresh = logger.log(new_notification(NotificationChannel::Push)).await.unwrap();

        let swept = logger
            .sweep_stale_pending(Duration::minutes(30), 100)
            .await
            .unwrap();
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].id, n.id);
        assert_eq!(swept[0].error_message.as_deref(), Some(STALE_PENDING_ERROR));
        assert_eq!(
            store.get(fresh.id).await.unwrap().status,
            NotificationStatus::Pending
        );
    }
}
