//! Notification status, channel, type, and priority enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use tourhub_core::AppError;

use crate::order::OrderPriority;

/// Delivery status of a notification record.
///
/// ```text
/// PENDING ──► SENT ──► DELIVERED
///    │          │
///    └──► FAILED ◄┘
///           │
///           └──► PENDING   (retry)
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    /// Created, not yet handed to a channel.
    Pending,
    /// Accepted by the channel.
    Sent,
    /// Delivery confirmed by the channel.
    Delivered,
    /// Channel reported an error.
    Failed,
}

impl NotificationStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: NotificationStatus) -> bool {
        use NotificationStatus::*;
        matches!(
            (self, next),
            (Pending, Sent) | (Pending, Failed) | (Sent, Delivered) | (Sent, Failed) | (Failed, Pending)
        )
    }

    /// Whether the record counts as sent for statistics (SENT or DELIVERED).
    pub fn counts_as_sent(&self) -> bool {
        matches!(self, Self::Sent | Self::Delivered)
    }

    /// Whether retention cleanup may delete a record in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Delivered => "DELIVERED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "notification_channel", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannel {
    /// In-app notification list.
    InApp,
    /// Email.
    Email,
    /// SMS text message.
    Sms,
    /// Mobile push.
    Push,
}

impl NotificationChannel {
    /// Every channel, in display order.
    pub const ALL: [NotificationChannel; 4] = [Self::InApp, Self::Email, Self::Sms, Self::Push];

    /// Return the channel as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "IN_APP",
            Self::Email => "EMAIL",
            Self::Sms => "SMS",
            Self::Push => "PUSH",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "IN_APP" => Ok(Self::InApp),
            "EMAIL" => Ok(Self::Email),
            "SMS" => Ok(Self::Sms),
            "PUSH" => Ok(Self::Push),
            _ => Err(AppError::validation(format!("Unknown notification channel: '{s}'"))),
        }
    }
}

/// What a notification is about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// Booking confirmation.
    OrderConfirmed,
    /// Payment received.
    PaymentSuccess,
    /// Booking cancelled.
    OrderCancelled,
    /// Upcoming booking reminder.
    Reminder,
    /// Site-wide announcement.
    SystemAnnouncement,
    /// Marketing message.
    Promotional,
}

impl NotificationType {
    /// Return the type as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderConfirmed => "ORDER_CONFIRMED",
            Self::PaymentSuccess => "PAYMENT_SUCCESS",
            Self::OrderCancelled => "ORDER_CANCELLED",
            Self::Reminder => "REMINDER",
            Self::SystemAnnouncement => "SYSTEM_ANNOUNCEMENT",
            Self::Promotional => "PROMOTIONAL",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification-level priority, independent of order priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    /// Low priority.
    Low,
    /// Normal priority (default).
    Normal,
    /// High priority.
    High,
    /// Critical priority.
    Critical,
}

impl NotificationPriority {
    /// Return the priority as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<OrderPriority> for NotificationPriority {
    fn from(priority: OrderPriority) -> Self {
        match priority {
            OrderPriority::Low => Self::Low,
            OrderPriority::Medium => Self::Normal,
            OrderPriority::High => Self::High,
            OrderPriority::Critical => Self::Critical,
        }
    }
}
