//! Notification persistence trait.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};

use tourhub_core::types::{NotificationId, PageRequest};
use tourhub_core::{AppError, AppResult};
use tourhub_entity::notification::{
    Notification, NotificationFilter, NotificationStatus, StatusCountRow,
};

/// Persists notification records.
///
/// Status changes go through [`compare_and_set`](Self::compare_and_set) so
/// that two writers racing on the same record cannot both win.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug {
    /// Insert a new record.
    async fn insert(&self, notification: &Notification) -> AppResult<Notification>;

    /// Find a record by id.
    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>>;

    /// Write the mutable lifecycle fields of `updated` if the stored status
    /// still equals `expected`.
    ///
    /// Returns `None` when the stored status no longer matches or the record
    /// is gone.
    async fn compare_and_set(
        &self,
        expected: NotificationStatus,
        updated: &Notification,
    ) -> AppResult<Option<Notification>>;

    /// One page of records matching `filter`, newest first, and the total match count.
    async fn query(
        &self,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<Notification>, u64)>;

    /// Grouped counts of records matching `filter`, with `day` taken in `tz`.
    async fn status_counts(
        &self,
        filter: &NotificationFilter,
        tz: FixedOffset,
    ) -> AppResult<Vec<StatusCountRow>>;

    /// FAILED records eligible for an automatic retry, oldest first.
    async fn find_retryable(&self, max_retries: i32, limit: i64) -> AppResult<Vec<Notification>>;

    /// PENDING records never sent and not touched since `cutoff`.
    async fn find_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Notification>>;

    /// Delete DELIVERED and FAILED records created before `cutoff`.
    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;

    /// Load a record or fail with `NotFound`.
    async fn get(&self, id: NotificationId) -> AppResult<Notification> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }
}
