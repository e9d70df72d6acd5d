//! User profile and scoring signal.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tourhub_core::types::UserId;

use super::role::UserRole;

/// The subset of a user record the booking core reads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub display_name: String,
    /// Loyalty points balance.
    pub points: i64,
    /// Role.
    pub role: UserRole,
    /// Email address, if any.
    pub email: Option<String>,
    /// Mobile number, if any.
    pub phone: Option<String>,
    /// Push device token, if any.
    pub push_token: Option<String>,
}

impl UserProfile {
    /// Project the fields used by priority scoring.
    pub fn signal(&self) -> UserSignal {
        UserSignal {
            points: self.points,
            role: self.role,
        }
    }
}

/// Read-only projection of a user used only for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSignal {
    /// Loyalty points.
    pub points: i64,
    /// Role.
    pub role: UserRole,
}

impl UserSignal {
    /// An ordinary user with no loyalty points.
    pub fn ordinary() -> Self {
        Self {
            points: 0,
            role: UserRole::User,
        }
    }
}
