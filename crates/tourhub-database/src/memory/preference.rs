//! In-memory channel preferences.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use tourhub_core::types::UserId;
use tourhub_core::AppResult;
use tourhub_entity::notification::{NotificationChannel, NotificationType};

use crate::store::ChannelPreferences;

/// Enabled channels keyed by user and notification type.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannelPreferences {
    channels: Arc<DashMap<(UserId, NotificationType), Vec<NotificationChannel>>>,
}

impl MemoryChannelPreferences {
    /// Create an empty preference table.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChannelPreferences for MemoryChannelPreferences {
    async fn enabled_channels(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
    ) -> AppResult<Vec<NotificationChannel>> {
        Ok(self
            .channels
            .get(&(user_id, notification_type))
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn set_channels(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
        channels: &[NotificationChannel],
    ) -> AppResult<()> {
        let mut channels = channels.to_vec();
        channels.sort();
        channels.dedup();
        self.channels.insert((user_id, notification_type), channels);
        Ok(())
    }
}
