//! Additive priority score and its mapping to a tier.
//!
//! The score is a pure function of the order, the user's loyalty signal,
//! and the instant it is evaluated at. Each term contributes
//! independently; nothing caps the sum before it is mapped.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tourhub_core::{AppError, AppResult};
use tourhub_entity::order::{Classification, NewOrder, Order, OrderStatus, PaymentStatus};
use tourhub_entity::user::{UserRole, UserSignal};

/// Loyalty balance that earns the points bonus.
const LOYALTY_POINTS_THRESHOLD: i64 = 500;
/// Window for the strongest time-sensitivity bonus.
const LAST_MINUTE_WINDOW_MS: i64 = 24 * 3_600_000;
/// Window for the weaker time-sensitivity bonus.
const SOON_WINDOW_MS: i64 = 72 * 3_600_000;

/// The order fields the score reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Order total.
    pub total_amount: Decimal,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Fulfilment state.
    pub status: OrderStatus,
    /// Booked slot.
    pub booking_date: Option<DateTime<Utc>>,
    /// Check-in time.
    pub check_in_date: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderSnapshot {
    fn from(order: &Order) -> Self {
        Self {
            total_amount: order.total_amount,
            payment_status: order.payment_status,
            status: order.status,
            booking_date: order.booking_date,
            check_in_date: order.check_in_date,
        }
    }
}

impl From<&NewOrder> for OrderSnapshot {
    fn from(order: &NewOrder) -> Self {
        Self {
            total_amount: order.total_amount,
            payment_status: order.payment_status,
            status: order.status,
            booking_date: order.booking_date,
            check_in_date: order.check_in_date,
        }
    }
}

/// Computes priority scores and tiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityClassifier;

impl PriorityClassifier {
    /// Create a classifier.
    pub fn new() -> Self {
        Self
    }

    /// Score an order for `user` as of `now`.
    ///
    /// Rejects negative amounts and negative loyalty balances.
    pub fn compute_score(
        &self,
        order: &OrderSnapshot,
        user: &UserSignal,
        now: DateTime<Utc>,
    ) -> AppResult<i32> {
        if order.total_amount < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Order amount must not be negative, got {}",
                order.total_amount
            )));
        }
        if user.points < 0 {
            return Err(AppError::validation(format!(
                "Loyalty points must not be negative, got {}",
                user.points
            )));
        }

        Ok(amount_score(order.total_amount)
            + payment_score(order.payment_status, order.status)
            + loyalty_score(user)
            + time_score(order.check_in_date.or(order.booking_date), now))
    }

    /// Map a score to its tier.
    pub fn score_to_tier(&self, score: i32) -> Classification {
        Classification::from_score(score)
    }

    /// Score and map in one step.
    pub fn classify(
        &self,
        order: &OrderSnapshot,
        user: &UserSignal,
        now: DateTime<Utc>,
    ) -> AppResult<Classification> {
        Ok(self.score_to_tier(self.compute_score(order, user, now)?))
    }
}

fn amount_score(amount: Decimal) -> i32 {
    if amount >= Decimal::from(2000) {
        40
    } else if amount >= Decimal::from(1000) {
        25
    } else if amount >= Decimal::from(500) {
        15
    } else {
        0
    }
}

// The two terms are independent; an order can earn both.
fn payment_score(payment: PaymentStatus, status: OrderStatus) -> i32 {
    let mut score = 0;
    if payment == PaymentStatus::Paid && status == OrderStatus::Pending {
        score += 20;
    }
    if status == OrderStatus::Confirmed {
        score += 10;
    }
    score
}

fn loyalty_score(user: &UserSignal) -> i32 {
    let mut score = 0;
    if user.points >= LOYALTY_POINTS_THRESHOLD {
        score += 10;
    }
    if user.role == UserRole::Vip {
        score += 10;
    }
    score
}

fn time_score(target: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i32 {
    let Some(target) = target else {
        return 0;
    };
    let distance = (target - now).num_milliseconds().abs();
    if distance <= LAST_MINUTE_WINDOW_MS {
        30
    } else if distance <= SOON_WINDOW_MS {
        15
    } else {
        0
    }
}
