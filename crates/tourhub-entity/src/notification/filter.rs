//! Query filter over logged notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tourhub_core::types::{OrderId, UserId};

use super::model::Notification;
use super::status::{NotificationChannel, NotificationPriority, NotificationStatus, NotificationType};

/// Filter fields shared by notification listing and statistics.
///
/// Every field is optional; unset fields match everything. The creation
/// window is half-open: `created_from <= created_at < created_to`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFilter {
    /// Restrict to one recipient.
    pub user_id: Option<UserId>,
    /// Restrict to one order.
    pub order_id: Option<OrderId>,
    /// Restrict to one channel.
    pub channel: Option<NotificationChannel>,
    /// Restrict to one notification type.
    pub notification_type: Option<NotificationType>,
    /// Restrict to one status.
    pub status: Option<NotificationStatus>,
    /// Restrict to one priority.
    pub priority: Option<NotificationPriority>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
}

impl NotificationFilter {
    /// Filter scoped to a single user.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Whether `n` passes every set field.
    pub fn matches(&self, n: &Notification) -> bool {
        self.user_id.is_none_or(|id| n.user_id == id)
            && self.order_id.is_none_or(|id| n.order_id == Some(id))
            && self.channel.is_none_or(|c| n.channel == c)
            && self.notification_type.is_none_or(|t| n.notification_type == t)
            && self.status.is_none_or(|s| n.status == s)
            && self.priority.is_none_or(|p| n.priority == p)
            && self.created_from.is_none_or(|from| n.created_at >= from)
            && self.created_to.is_none_or(|to| n.created_at < to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{NewNotification, NotificationPayload};
    use chrono::Duration;

    fn sample(user_id: UserId) -> Notification {
        Notification::from_new(
            NewNotification {
                user_id,
                order_id: None,
                channel: NotificationChannel::Sms,
                priority: NotificationPriority::High,
                title: "t".into(),
                content: "c".into(),
                metadata: NotificationPayload::Promotional {
                    campaign: "autumn".into(),
                    link: None,
                },
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(NotificationFilter::default().matches(&sample(UserId::new())));
    }

    #[test]
    fn test_field_filters() {
        let user = UserId::new();
        let n = sample(user);

        assert!(NotificationFilter::for_user(user).matches(&n));
        assert!(!NotificationFilter::for_user(UserId::new()).matches(&n));

        let by_channel = NotificationFilter {
            channel: Some(NotificationChannel::Email),
            ..Default::default()
        };
        assert!(!by_channel.matches(&n));

        let by_order = NotificationFilter {
            order_id: Some(OrderId::new()),
            ..Default::default()
        };
        assert!(!by_order.matches(&n));
    }

    #[test]
    fn test_created_window_is_half_open() {
        let n = sample(UserId::new());
        let window = NotificationFilter {
            created_from: Some(n.created_at),
            created_to: Some(n.created_at + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(window.matches(&n));

        let ends_at_creation = NotificationFilter {
            created_to: Some(n.created_at),
            ..Default::default()
        };
        assert!(!ends_at_creation.matches(&n));
    }
}
