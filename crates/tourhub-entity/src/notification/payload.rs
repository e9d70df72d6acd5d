//! Typed notification payloads, one variant per notification type.
//!
//! Payloads are decoded once at the boundary and stored as JSONB; the
//! variant determines the record's [`NotificationType`].

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::status::NotificationType;

/// Kind of service a booking is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    /// Attraction ticket.
    Attraction,
    /// Lodging stay.
    Lodging,
    /// Restaurant reservation.
    Dining,
}

impl ServiceKind {
    /// Human-readable label used in rendered messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Attraction => "Attraction",
            Self::Lodging => "Lodging",
            Self::Dining => "Dining",
        }
    }
}

/// Snapshot of a booking carried by a confirmation notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BookingDetails {
    /// Confirmation number shown to the customer.
    #[validate(length(min = 1, max = 64))]
    pub confirmation_number: String,
    /// Name of the booked attraction, hotel, or restaurant.
    #[validate(length(min = 1, max = 200))]
    pub service_name: String,
    /// Service kind.
    pub service_kind: ServiceKind,
    /// Amount charged.
    pub amount: Decimal,
    /// Booked date.
    pub date: NaiveDate,
    /// Booked time slot, free-form (e.g. `"18:30"`).
    #[validate(length(max = 32))]
    pub time: Option<String>,
    /// Number of guests.
    pub guests: Option<u32>,
    /// Contact person.
    #[validate(length(min = 1, max = 100))]
    pub contact_name: String,
    /// Contact phone.
    #[validate(length(max = 32))]
    pub contact_phone: Option<String>,
    /// Contact email.
    #[validate(email)]
    pub contact_email: Option<String>,
}

impl BookingDetails {
    /// Placeholder values for template rendering.
    pub fn template_variables(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("confirmation_number".into(), self.confirmation_number.clone());
        vars.insert("service_name".into(), self.service_name.clone());
        vars.insert("service_kind".into(), self.service_kind.label().to_string());
        vars.insert("amount".into(), self.amount.round_dp(2).to_string());
        vars.insert("date".into(), self.date.format("%Y-%m-%d").to_string());
        vars.insert("time".into(), self.time.clone().unwrap_or_default());
        vars.insert(
            "guests".into(),
            self.guests.map(|g| g.to_string()).unwrap_or_default(),
        );
        vars.insert("contact_name".into(), self.contact_name.clone());
        vars.insert(
            "contact_phone".into(),
            self.contact_phone.clone().unwrap_or_default(),
        );
        vars.insert(
            "contact_email".into(),
            self.contact_email.clone().unwrap_or_default(),
        );
        vars
    }
}

/// Structured metadata attached to a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// Booking confirmation.
    OrderConfirmed(BookingDetails),
    /// Payment received.
    PaymentSuccess {
        /// Confirmation number of the paid booking.
        confirmation_number: String,
        /// Amount paid.
        amount: Decimal,
        /// Payment method label.
        payment_method: Option<String>,
    },
    /// Booking cancelled.
    OrderCancelled {
        /// Confirmation number of the cancelled booking.
        confirmation_number: String,
        /// Cancellation reason.
        reason: Option<String>,
    },
    /// Upcoming booking reminder.
    Reminder {
        /// Confirmation number.
        confirmation_number: String,
        /// Booked service.
        service_name: String,
        /// When the booking starts.
        starts_at: DateTime<Utc>,
    },
    /// Site-wide announcement.
    SystemAnnouncement {
        /// Optional link for details.
        link: Option<String>,
    },
    /// Marketing message.
    Promotional {
        /// Campaign identifier.
        campaign: String,
        /// Landing page.
        link: Option<String>,
    },
}

impl NotificationPayload {
    /// The notification type this payload belongs to.
    pub fn notification_type(&self) -> NotificationType {
        match self {
            Self::OrderConfirmed(_) => NotificationType::OrderConfirmed,
            Self::PaymentSuccess { .. } => NotificationType::PaymentSuccess,
            Self::OrderCancelled { .. } => NotificationType::OrderCancelled,
            Self::Reminder { .. } => NotificationType::Reminder,
            Self::SystemAnnouncement { .. } => NotificationType::SystemAnnouncement,
            Self::Promotional { .. } => NotificationType::Promotional,
        }
    }

    /// Placeholder values contributed by the payload.
    pub fn template_variables(&self) -> HashMap<String, String> {
        match self {
            Self::OrderConfirmed(details) => details.template_variables(),
            Self::PaymentSuccess {
                confirmation_number,
                amount,
                payment_method,
            } => HashMap::from([
                ("confirmation_number".to_string(), confirmation_number.clone()),
                ("amount".to_string(), amount.round_dp(2).to_string()),
                (
                    "payment_method".to_string(),
                    payment_method.clone().unwrap_or_default(),
                ),
            ]),
            Self::OrderCancelled {
                confirmation_number,
                reason,
            } => HashMap::from([
                ("confirmation_number".to_string(), confirmation_number.clone()),
                ("reason".to_string(), reason.clone().unwrap_or_default()),
            ]),
            Self::Reminder {
                confirmation_number,
                service_name,
                starts_at,
            } => HashMap::from([
                ("confirmation_number".to_string(), confirmation_number.clone()),
                ("service_name".to_string(), service_name.clone()),
                (
                    "starts_at".to_string(),
                    starts_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                ),
            ]),
            Self::SystemAnnouncement { link } => HashMap::from([(
                "link".to_string(),
                link.clone().unwrap_or_default(),
            )]),
            Self::Promotional { campaign, link } => HashMap::from([
                ("campaign".to_string(), campaign.clone()),
                ("link".to_string(), link.clone().unwrap_or_default()),
            ]),
        }
    }
}
