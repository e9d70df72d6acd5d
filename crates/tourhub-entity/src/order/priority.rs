//! Order priority tiers and the score-to-tier mapping.
//!
//! [`Classification::from_score`] is the only place a score is turned
//! into a tier. Nothing else in the workspace compares scores against
//! tier thresholds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum score for [`OrderPriority::Critical`].
pub const CRITICAL_THRESHOLD: i32 = 60;
/// Minimum score for [`OrderPriority::High`].
pub const HIGH_THRESHOLD: i32 = 45;
/// Minimum score for [`OrderPriority::Medium`]; also the `is_priority` cut-off.
pub const MEDIUM_THRESHOLD: i32 = 25;

/// Derived priority tier of an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "order_priority", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPriority {
    /// Below every threshold.
    Low,
    /// Score of at least 25.
    Medium,
    /// Score of at least 45.
    High,
    /// Score of at least 60.
    Critical,
}

impl OrderPriority {
    /// Return the priority as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived urgency of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "urgency_level", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    /// No special handling.
    Normal,
    /// Needs attention soon.
    TimeSensitive,
    /// Needs attention now.
    LastMinute,
    /// Reserved for manual VIP handling.
    Vip,
}

impl UrgencyLevel {
    /// Return the urgency as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::TimeSensitive => "TIME_SENSITIVE",
            Self::LastMinute => "LAST_MINUTE",
            Self::Vip => "VIP",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A score together with the tier derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Derived tier.
    pub priority: OrderPriority,
    /// Derived urgency.
    pub urgency_level: UrgencyLevel,
    /// Whether the score clears the minimum priority threshold.
    pub is_priority: bool,
    /// Raw score.
    pub priority_score: i32,
}

impl Classification {
    /// Map a raw score to its tier. Bands are closed on their lower bound.
    pub fn from_score(score: i32) -> Self {
        let (priority, urgency_level, is_priority) = if score >= CRITICAL_THRESHOLD {
            (OrderPriority::Critical, UrgencyLevel::LastMinute, true)
        } else if score >= HIGH_THRESHOLD {
            (OrderPriority::High, UrgencyLevel::TimeSensitive, true)
        } else if score >= MEDIUM_THRESHOLD {
            (OrderPriority::Medium, UrgencyLevel::Normal, true)
        } else {
            (OrderPriority::Low, UrgencyLevel::Normal, false)
        };

        Self {
            priority,
            urgency_level,
            is_priority,
            priority_score: score,
        }
    }
}

/// An operator-chosen tier that replaces the score-derived one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualPriority {
    /// Tier to apply.
    pub priority: OrderPriority,
    /// Urgency to apply.
    pub urgency_level: UrgencyLevel,
    /// Priority flag to apply.
    pub is_priority: bool,
}
