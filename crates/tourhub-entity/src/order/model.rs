//! Order entity model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tourhub_core::types::{OrderId, UserId};
use tourhub_core::AppError;

use super::priority::{Classification, ManualPriority, OrderPriority, UrgencyLevel};
use super::status::{OrderStatus, PaymentStatus};

/// A booking order, restricted to the fields the booking core reads or writes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Order total.
    pub total_amount: Decimal,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Fulfilment state.
    pub status: OrderStatus,
    /// When the booking was made for (e.g. attraction or dining slot).
    pub booking_date: Option<DateTime<Utc>>,
    /// Lodging check-in time.
    pub check_in_date: Option<DateTime<Utc>>,
    /// Derived tier.
    pub priority: OrderPriority,
    /// Derived urgency.
    pub urgency_level: UrgencyLevel,
    /// Raw score behind the tier.
    pub priority_score: i32,
    /// Whether the score clears the priority threshold.
    pub is_priority: bool,
    /// Whether an operator replaced the derived tier.
    pub priority_overridden: bool,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order record from validated input and its classification.
    pub fn from_new(new: NewOrder, classification: Classification, now: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::new(),
            user_id: new.user_id,
            total_amount: new.total_amount,
            payment_status: new.payment_status,
            status: new.status,
            booking_date: new.booking_date,
            check_in_date: new.check_in_date,
            priority: classification.priority,
            urgency_level: classification.urgency_level,
            priority_score: classification.priority_score,
            is_priority: classification.is_priority,
            priority_overridden: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// The classification currently stored on the order.
    pub fn classification(&self) -> Classification {
        Classification {
            priority: self.priority,
            urgency_level: self.urgency_level,
            is_priority: self.is_priority,
            priority_score: self.priority_score,
        }
    }

    /// Whether the stored tier agrees with the stored score.
    ///
    /// Overridden orders are consistent by definition; the override is
    /// tracked explicitly rather than silently diverging.
    pub fn is_consistent(&self) -> bool {
        self.priority_overridden
            || self.classification() == Classification::from_score(self.priority_score)
    }

    /// Apply a freshly computed classification, clearing any override.
    pub fn apply_classification(&mut self, classification: Classification, now: DateTime<Utc>) {
        self.priority = classification.priority;
        self.urgency_level = classification.urgency_level;
        self.is_priority = classification.is_priority;
        self.priority_score = classification.priority_score;
        self.priority_overridden = false;
        self.updated_at = now;
    }

    /// Apply an operator override. The score is left untouched.
    pub fn apply_override(&mut self, manual: ManualPriority, now: DateTime<Utc>) {
        self.priority = manual.priority;
        self.urgency_level = manual.urgency_level;
        self.is_priority = manual.is_priority;
        self.priority_overridden = true;
        self.updated_at = now;
    }
}

/// Data required to create a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    /// Owning user.
    pub user_id: UserId,
    /// Order total.
    pub total_amount: Decimal,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Fulfilment state.
    pub status: OrderStatus,
    /// Booked slot, if any.
    pub booking_date: Option<DateTime<Utc>>,
    /// Check-in time, if any.
    pub check_in_date: Option<DateTime<Utc>>,
}

impl NewOrder {
    /// Reject input that must never reach the store.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.total_amount < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Order amount must not be negative, got {}",
                self.total_amount
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_order(amount: i64) -> NewOrder {
        NewOrder {
            user_id: UserId::new(),
            total_amount: Decimal::from(amount),
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            booking_date: None,
            check_in_date: None,
        }
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(new_order(-1).validate().is_err());
        assert!(new_order(0).validate().is_ok());
    }

    #[test]
    fn test_override_keeps_score_and_stays_consistent() {
        let now = Utc::now();
        let mut order = Order::from_new(new_order(100), Classification::from_score(10), now);
        assert!(order.is_consistent());

        order.apply_override(
            ManualPriority {
                priority: OrderPriority::Critical,
                urgency_level: UrgencyLevel::Vip,
                is_priority: true,
            },
            now,
        );
        assert_eq!(order.priority_score, 10);
        assert!(order.priority_overridden);
        assert!(order.is_consistent());

        order.apply_classification(Classification::from_score(10), now);
        assert!(!order.priority_overridden);
        assert_eq!(order.priority, OrderPriority::Low);
    }

    #[test]
    fn test_tampered_tier_is_inconsistent() {
        let mut order = Order::from_new(new_order(100), Classification::from_score(10), Utc::now());
        order.priority = OrderPriority::High;
        assert!(!order.is_consistent());
    }
}
