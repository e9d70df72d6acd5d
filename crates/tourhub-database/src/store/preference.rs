//! Per-user channel preference trait.

use async_trait::async_trait;

use tourhub_core::types::UserId;
use tourhub_core::AppResult;
use tourhub_entity::notification::{NotificationChannel, NotificationType};

/// Which channels a user receives a notification type on.
#[async_trait]
pub trait ChannelPreferences: Send + Sync + std::fmt::Debug {
    /// Enabled channels for `user_id` and `notification_type`.
    ///
    /// An empty result means the user has not configured the type.
    async fn enabled_channels(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
    ) -> AppResult<Vec<NotificationChannel>>;

    /// Replace the enabled channels for a user and type.
    async fn set_channels(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
        channels: &[NotificationChannel],
    ) -> AppResult<()>;
}
