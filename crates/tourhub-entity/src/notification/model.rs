//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tourhub_core::types::{NotificationId, OrderId, UserId};
use tourhub_core::{AppError, AppResult};

use super::payload::NotificationPayload;
use super::status::{NotificationChannel, NotificationPriority, NotificationStatus, NotificationType};

/// A logged notification attempt on a single channel.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// Recipient user; ownership is by this field.
    pub user_id: UserId,
    /// Related order, if any.
    pub order_id: Option<OrderId>,
    /// What the notification is about.
    pub notification_type: NotificationType,
    /// Delivery channel.
    pub channel: NotificationChannel,
    /// Delivery status.
    pub status: NotificationStatus,
    /// Notification-level priority.
    pub priority: NotificationPriority,
    /// Rendered title.
    pub title: String,
    /// Rendered body.
    pub content: String,
    /// Structured payload.
    #[sqlx(json)]
    pub metadata: NotificationPayload,
    /// Retry attempts made so far.
    pub retry_count: i32,
    /// Last channel error; present only while FAILED.
    pub error_message: Option<String>,
    /// Whether automatic retries may pick this record up.
    pub retryable: bool,
    /// When the channel first accepted the message.
    pub sent_at: Option<DateTime<Utc>>,
    /// When delivery was first confirmed.
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Create a PENDING record from a new notification.
    pub fn from_new(new: NewNotification, now: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::new(),
            user_id: new.user_id,
            order_id: new.order_id,
            notification_type: new.metadata.notification_type(),
            channel: new.channel,
            status: NotificationStatus::Pending,
            priority: new.priority,
            title: new.title,
            content: new.content,
            metadata: new.metadata,
            retry_count: 0,
            error_message: None,
            retryable: true,
            sent_at: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the record to `to`, enforcing the state machine.
    ///
    /// FAILED requires a non-empty error; any other state clears it.
    /// `sent_at` and `delivered_at` are set on first entry and never cleared.
    pub fn apply_transition(
        &mut self,
        to: NotificationStatus,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if !self.status.can_transition_to(to) {
            return Err(AppError::conflict(format!(
                "Notification {} cannot move from {} to {}",
                self.id, self.status, to
            )));
        }

        let error_message = match to {
            NotificationStatus::Failed => {
                let message = error_message
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .ok_or_else(|| {
                        AppError::validation("A FAILED transition requires an error message")
                    })?;
                Some(message)
            }
            _ => None,
        };

        match to {
            NotificationStatus::Sent if self.sent_at.is_none() => self.sent_at = Some(now),
            NotificationStatus::Delivered if self.delivered_at.is_none() => {
                self.delivered_at = Some(now)
            }
            _ => {}
        }

        self.status = to;
        self.error_message = error_message;
        self.retryable = true;
        self.updated_at = now;
        Ok(())
    }

    /// Exclude a FAILED record from automatic retries.
    pub fn mark_permanent(&mut self) {
        if self.status == NotificationStatus::Failed {
            self.retryable = false;
        }
    }

    /// Whether an automatic retry is allowed under `max_retries`.
    pub fn can_retry(&self, max_retries: i32) -> bool {
        self.status == NotificationStatus::Failed
            && self.retryable
            && self.retry_count < max_retries
    }

    /// Whether the retry budget is used up.
    pub fn retries_exhausted(&self, max_retries: i32) -> bool {
        self.retry_count >= max_retries
    }

    /// Count a retry attempt and re-enter PENDING.
    pub fn begin_retry(&mut self, max_retries: i32, now: DateTime<Utc>) -> AppResult<()> {
        if self.status != NotificationStatus::Failed {
            return Err(AppError::conflict(format!(
                "Notification {} is {}, only FAILED records can be retried",
                self.id, self.status
            )));
        }
        if self.retry_count >= max_retries {
            return Err(AppError::conflict(format!(
                "Notification {} already used {} of {} retries",
                self.id, self.retry_count, max_retries
            )));
        }
        self.retry_count += 1;
        self.status = NotificationStatus::Pending;
        self.error_message = None;
        self.retryable = true;
        self.updated_at = now;
        Ok(())
    }
}

/// Data required to log a new notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Related order.
    pub order_id: Option<OrderId>,
    /// Channel.
    pub channel: NotificationChannel,
    /// Priority.
    pub priority: NotificationPriority,
    /// Rendered title.
    pub title: String,
    /// Rendered body.
    pub content: String,
    /// Payload; also determines the notification type.
    pub metadata: NotificationPayload,
}
