//! Caller identity passed explicitly into every use case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tourhub_core::types::UserId;
use tourhub_core::{AppError, AppResult};
use tourhub_entity::notification::NotificationFilter;
use tourhub_entity::user::UserRole;

/// Who is acting on the current request.
///
/// Authentication happens upstream; the HTTP layer builds this from
/// trusted gateway headers and tests construct it directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// The acting user.
    pub user_id: UserId,
    /// The acting user's role.
    pub role: UserRole,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl AuthContext {
    /// Create a context for `user_id` acting with `role`.
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self {
            user_id,
            role,
            request_time: Utc::now(),
        }
    }

    /// Whether the caller is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fail unless the caller is an administrator.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::authorization("Administrator role required"))
        }
    }

    /// Fail unless the caller owns the resource or is an administrator.
    pub fn require_owner(&self, owner: UserId) -> AppResult<()> {
        if self.is_admin() || self.user_id == owner {
            Ok(())
        } else {
            Err(AppError::authorization("Resource belongs to another user"))
        }
    }

    /// Narrow a notification filter to what the caller may see.
    pub fn scope_filter(&self, mut filter: NotificationFilter) -> NotificationFilter {
        if !self.is_admin() {
            filter.user_id = Some(self.user_id);
        }
        filter
    }
}
