//! Notification channel preference repository.

use async_trait::async_trait;
use sqlx::PgPool;

use tourhub_core::error::{AppError, ErrorKind};
use tourhub_core::result::AppResult;
use tourhub_core::types::UserId;
use tourhub_entity::notification::{NotificationChannel, NotificationType};

use crate::store::ChannelPreferences;

/// Repository for the `notification_preferences` table.
#[derive(Debug, Clone)]
pub struct PreferenceRepository {
    pool: PgPool,
}

impl PreferenceRepository {
    /// Create a new preference repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelPreferences for PreferenceRepository {
    async fn enabled_channels(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
    ) -> AppResult<Vec<NotificationChannel>> {
        sqlx::query_scalar::<_, NotificationChannel>(
            "SELECT channel FROM notification_preferences \
             WHERE user_id = $1 AND notification_type = $2 AND enabled ORDER BY channel",
        )
        .bind(user_id)
        .bind(notification_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load preferences", e))
    }

    async fn set_channels(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
        channels: &[NotificationChannel],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query(
            "DELETE FROM notification_preferences WHERE user_id = $1 AND notification_type = $2",
        )
        .bind(user_id)
        .bind(notification_type)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear preferences", e))?;

        for channel in channels {
            sqlx::query(
                "INSERT INTO notification_preferences (user_id, notification_type, channel, enabled) \
                 VALUES ($1, $2, $3, TRUE) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(notification_type)
            .bind(*channel)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to save preference", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit preferences", e)
        })
    }
}
