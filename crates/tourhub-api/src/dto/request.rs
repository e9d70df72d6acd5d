//! Request DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use tourhub_core::types::{OrderId, PageRequest, UserId};
use tourhub_entity::notification::{
    BookingDetails, NotificationChannel, NotificationFilter, NotificationPriority,
    NotificationStatus, NotificationType,
};
use tourhub_entity::order::{NewOrder, OrderStatus, PaymentStatus};

/// `POST /api/orders`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    /// Owner; defaults to the caller.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Order total.
    pub total_amount: Decimal,
    /// Payment state.
    #[serde(default = "default_payment_status")]
    pub payment_status: PaymentStatus,
    /// Order lifecycle state.
    #[serde(default = "default_order_status")]
    pub status: OrderStatus,
    /// Service date.
    #[serde(default)]
    pub booking_date: Option<DateTime<Utc>>,
    /// Check-in date.
    #[serde(default)]
    pub check_in_date: Option<DateTime<Utc>>,
    /// What the confirmation message describes.
    #[validate(nested)]
    pub booking: BookingDetails,
}

impl CreateOrderRequest {
    /// Split into the order to persist and the confirmation details.
    pub fn into_parts(self, caller: UserId) -> (NewOrder, BookingDetails) {
        let order = NewOrder {
            user_id: self.user_id.unwrap_or(caller),
            total_amount: self.total_amount,
            payment_status: self.payment_status,
            status: self.status,
            booking_date: self.booking_date,
            check_in_date: self.check_in_date,
        };
        (order, self.booking)
    }
}

fn default_payment_status() -> PaymentStatus {
    PaymentStatus::Pending
}

fn default_order_status() -> OrderStatus {
    OrderStatus::Pending
}

/// `POST /api/notifications/{id}/receipt`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceiptRequest {
    /// `DELIVERED`, or `FAILED` for a bounce.
    pub status: NotificationStatus,
    /// Bounce reason; required for `FAILED`.
    #[serde(default)]
    pub error_message: Option<String>,
}

/// `POST /api/admin/notifications/cleanup`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupQuery {
    /// Overrides the configured retention.
    pub retention_days: Option<i64>,
}

/// Query string for `GET /api/notifications` and `GET /api/notifications/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page.
    pub page_size: Option<u64>,
    /// Recipient; ignored for non-admin callers.
    pub user_id: Option<UserId>,
    /// Related order.
    pub order_id: Option<OrderId>,
    /// Channel.
    pub channel: Option<NotificationChannel>,
    /// Notification type.
    pub notification_type: Option<NotificationType>,
    /// Status.
    pub status: Option<NotificationStatus>,
    /// Priority.
    pub priority: Option<NotificationPriority>,
    /// Created at or after.
    pub created_from: Option<DateTime<Utc>>,
    /// Created before.
    pub created_to: Option<DateTime<Utc>>,
}

impl NotificationQuery {
    /// The filter part of the query.
    pub fn filter(&self) -> NotificationFilter {
        NotificationFilter {
            user_id: self.user_id,
            order_id: self.order_id,
            channel: self.channel,
            notification_type: self.notification_type,
            status: self.status,
            priority: self.priority,
            created_from: self.created_from,
            created_to: self.created_to,
        }
    }

    /// The paging part of the query, clamped to valid values.
    pub fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        )
    }
}
