//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use tourhub_core::error::{AppError, ErrorKind};
use tourhub_core::result::AppResult;
use tourhub_core::types::UserId;
use tourhub_entity::user::UserProfile;

use crate::store::UserDirectory;

/// Read-only repository over the `users` table.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_profile(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT id, display_name, points, role, email, phone, push_token \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }
}
