//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use tourhub_core::error::{AppError, ErrorKind};
use tourhub_core::result::AppResult;
use tourhub_core::types::{NotificationId, PageRequest};
use tourhub_entity::notification::{
    Notification, NotificationFilter, NotificationStatus, StatusCountRow,
};

use crate::store::NotificationStore;

/// Repository for the `notifications` table.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append `WHERE` clauses for every set filter field.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &NotificationFilter) {
    qb.push(" WHERE TRUE");
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(order_id) = filter.order_id {
        qb.push(" AND order_id = ").push_bind(order_id);
    }
    if let Some(channel) = filter.channel {
        qb.push(" AND channel = ").push_bind(channel);
    }
    if let Some(notification_type) = filter.notification_type {
        qb.push(" AND notification_type = ").push_bind(notification_type);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
    if let Some(from) = filter.created_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        qb.push(" AND created_at < ").push_bind(to);
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert(&self, n: &Notification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, user_id, order_id, notification_type, channel, status, \
             priority, title, content, metadata, retry_count, error_message, retryable, sent_at, \
             delivered_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING *",
        )
        .bind(n.id)
        .bind(n.user_id)
        .bind(n.order_id)
        .bind(n.notification_type)
        .bind(n.channel)
        .bind(n.status)
        .bind(n.priority)
        .bind(&n.title)
        .bind(&n.content)
        .bind(Json(&n.metadata))
        .bind(n.retry_count)
        .bind(&n.error_message)
        .bind(n.retryable)
        .bind(n.sent_at)
        .bind(n.delivered_at)
        .bind(n.created_at)
        .bind(n.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find notification", e)
            })
    }

    async fn compare_and_set(
        &self,
        expected: NotificationStatus,
        n: &Notification,
    ) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET status = $3, error_message = $4, retryable = $5, \
             retry_count = $6, sent_at = $7, delivered_at = $8, updated_at = $9 \
             WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(n.id)
        .bind(expected)
        .bind(n.status)
        .bind(&n.error_message)
        .bind(n.retryable)
        .bind(n.retry_count)
        .bind(n.sent_at)
        .bind(n.delivered_at)
        .bind(n.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update notification", e))
    }

    async fn query(
        &self,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<Notification>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM notifications");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
            })?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM notifications");
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let items = select
            .build_query_as::<Notification>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list notifications", e)
            })?;

        Ok((items, total.max(0) as u64))
    }

    async fn status_counts(
        &self,
        filter: &NotificationFilter,
        tz: FixedOffset,
    ) -> AppResult<Vec<StatusCountRow>> {
        let offset_minutes = tz.local_minus_utc() / 60;
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT channel, notification_type, status, \
             ((created_at AT TIME ZONE 'UTC') + make_interval(mins => ",
        );
        qb.push_bind(offset_minutes)
            .push("))::date AS day, COUNT(*) AS count FROM notifications");
        push_filter(&mut qb, filter);
        qb.push(" GROUP BY 1, 2, 3, 4 ORDER BY 4");

        qb.build_query_as::<StatusCountRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to aggregate notifications", e)
            })
    }

    async fn find_retryable(&self, max_retries: i32, limit: i64) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE status = 'failed' AND retryable AND retry_count < $1 \
             ORDER BY updated_at, id LIMIT $2",
        )
        .bind(max_retries)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find retryable notifications", e)
        })
    }

    async fn find_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE status = 'pending' AND sent_at IS NULL AND updated_at < $1 \
             ORDER BY updated_at, id LIMIT $2",
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find stale notifications", e)
        })
    }

    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications \
             WHERE status IN ('delivered', 'failed') AND created_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to clean up notifications", e)
        })?;
        Ok(result.rows_affected())
    }
}
