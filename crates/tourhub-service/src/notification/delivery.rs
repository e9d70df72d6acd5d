//! One send attempt for one PENDING record.

use std::sync::Arc;

use tracing::{info, warn};

use tourhub_core::{AppResult, ErrorKind};
use tourhub_database::store::UserDirectory;
use tourhub_entity::notification::{Notification, NotificationChannel, NotificationStatus};
use tourhub_entity::user::UserProfile;

use super::logger::NotificationLogger;
use super::sender::{OutgoingMessage, SendError, SenderRegistry};

/// Resolves the recipient, calls the channel sender, and records the outcome.
#[derive(Debug, Clone)]
pub struct ChannelDelivery {
    senders: Arc<SenderRegistry>,
    users: Arc<dyn UserDirectory>,
    logger: Arc<NotificationLogger>,
}

impl ChannelDelivery {
    /// Create a delivery helper.
    pub fn new(
        senders: Arc<SenderRegistry>,
        users: Arc<dyn UserDirectory>,
        logger: Arc<NotificationLogger>,
    ) -> Self {
        Self {
            senders,
            users,
            logger,
        }
    }

    /// Send a PENDING record and move it to SENT, DELIVERED, or FAILED.
    ///
    /// Channel errors never escape; only persistence failures do.
    pub async fn attempt(&self, notification: Notification) -> AppResult<Notification> {
        let id = notification.id;
        let channel = notification.channel;

        let outcome = match self.message_for(&notification).await? {
            Ok(message) => match self.senders.get(channel) {
                Some(sender) => sender.send(&message).await,
                None => Err(SendError::Unavailable(format!(
                    "no sender registered for {channel}"
                ))),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(receipt) => {
                let sent = self
                    .logger
                    .update_status(id, NotificationStatus::Sent, None)
                    .await?;
                if !receipt.delivered {
                    info!(notification_id = %id, channel = %channel, "Notification sent");
                    return Ok(sent);
                }
                let delivered = self
                    .logger
                    .update_status(id, NotificationStatus::Delivered, None)
                    .await?;
                info!(notification_id = %id, channel = %channel, "Notification delivered");
                Ok(delivered)
            }
            Err(e) => {
                warn!(
                    notification_id = %id,
                    channel = %channel,
                    retry_count = notification.retry_count,
                    error = %e,
                    "Notification send failed"
                );
                self.logger
                    .record_failure(id, e.to_string(), !e.is_permanent())
                    .await
            }
        }
    }

    /// Build the outgoing message, or the send error explaining why there is none.
    async fn message_for(
        &self,
        notification: &Notification,
    ) -> AppResult<Result<OutgoingMessage, SendError>> {
        let profile = match self.users.get_profile(notification.user_id).await {
            Ok(profile) => profile,
            Err(e) if e.kind == ErrorKind::NotFound => {
                return Ok(Err(SendError::Permanent(format!(
                    "user {} not found",
                    notification.user_id
                ))));
            }
            Err(e) => return Err(e),
        };

        Ok(recipient_for(notification.channel, &profile).map(|recipient| OutgoingMessage {
            notification_id: notification.id,
            channel: notification.channel,
            recipient,
            title: notification.title.clone(),
            content: notification.content.clone(),
            metadata: notification.metadata.clone(),
        }))
    }
}

/// The address a channel delivers to.
pub fn recipient_for(
    channel: NotificationChannel,
    profile: &UserProfile,
) -> Result<String, SendError> {
    let address = match channel {
        NotificationChannel::InApp => return Ok(profile.id.to_string()),
        NotificationChannel::Email => profile.email.as_deref(),
        NotificationChannel::Sms => profile.phone.as_deref(),
        NotificationChannel::Push => profile.push_token.as_deref(),
    };
    address
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SendError::Permanent(format!("no {channel} address on file")))
}
