//! In-memory notification store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tokio::sync::RwLock;

use tourhub_core::types::{NotificationId, PageRequest};
use tourhub_core::{AppError, AppResult};
use tourhub_entity::notification::{
    Notification, NotificationChannel, NotificationFilter, NotificationStatus, NotificationType,
    StatusCountRow,
};

use crate::store::NotificationStore;

type GroupKey = (NotificationChannel, NotificationType, NotificationStatus, NaiveDate);

/// Notifications held in a map behind one lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationStore {
    records: Arc<RwLock<HashMap<NotificationId, Notification>>>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record, oldest first.
    pub async fn all(&self) -> Vec<Notification> {
        let mut all: Vec<Notification> = self.records.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    /// Overwrite a record wholesale. Lets tests age records.
    pub async fn put(&self, notification: Notification) {
        self.records
            .write()
            .await
            .insert(notification.id, notification);
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<Notification> {
        let mut records = self.records.write().await;
        if records.contains_key(&notification.id) {
            return Err(AppError::conflict(format!(
                "Notification {} already exists",
                notification.id
            )));
        }
        records.insert(notification.id, notification.clone());
        Ok(notification.clone())
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn compare_and_set(
        &self,
        expected: NotificationStatus,
        updated: &Notification,
    ) -> AppResult<Option<Notification>> {
        let mut records = self.records.write().await;
        let Some(stored) = records.get_mut(&updated.id) else {
            return Ok(None);
        };
        if stored.status != expected {
            return Ok(None);
        }

        stored.status = updated.status;
        stored.error_message = updated.error_message.clone();
        stored.retryable = updated.retryable;
        stored.retry_count = updated.retry_count;
        stored.sent_at = updated.sent_at;
        stored.delivered_at = updated.delivered_at;
        stored.updated_at = updated.updated_at;
        Ok(Some(stored.clone()))
    }

    async fn query(
        &self,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<Notification>, u64)> {
        let records = self.records.read().await;
        let mut matched: Vec<&Notification> = records.values().filter(|n| filter.matches(n)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn status_counts(
        &self,
        filter: &NotificationFilter,
        tz: FixedOffset,
    ) -> AppResult<Vec<StatusCountRow>> {
        let records = self.records.read().await;
        let mut groups: BTreeMap<GroupKey, i64> = BTreeMap::new();
        for n in records.values().filter(|n| filter.matches(n)) {
            let day = n.created_at.with_timezone(&tz).date_naive();
            *groups
                .entry((n.channel, n.notification_type, n.status, day))
                .or_insert(0) += 1;
        }

        Ok(groups
            .into_iter()
            .map(|((channel, notification_type, status, day), count)| StatusCountRow {
                channel,
                notification_type,
                status,
                day,
                count,
            })
            .collect())
    }

    async fn find_retryable(&self, max_retries: i32, limit: i64) -> AppResult<Vec<Notification>> {
        let records = self.records.read().await;
        let mut due: Vec<Notification> = records
            .values()
            .filter(|n| n.can_retry(max_retries))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn find_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let records = self.records.read().await;
        let mut stale: Vec<Notification> = records
            .values()
            .filter(|n| {
                n.status == NotificationStatus::Pending
                    && n.sent_at.is_none()
                    && n.updated_at < cutoff
            })
            .cloned()
            .collect();
        stale.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));
        stale.truncate(limit.max(0) as usize);
        Ok(stale)
    }

    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, n| !(n.status.is_terminal() && n.created_at < cutoff));
        Ok((before - records.len()) as u64)
    }
}
