//! User lookup trait.

use async_trait::async_trait;

use tourhub_core::types::UserId;
use tourhub_core::{AppError, AppResult};
use tourhub_entity::user::{UserProfile, UserSignal};

/// Read-only access to user profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug {
    /// Find a user's profile.
    async fn find_profile(&self, id: UserId) -> AppResult<Option<UserProfile>>;

    /// Load a user's profile or fail with `NotFound`.
    async fn get_profile(&self, id: UserId) -> AppResult<UserProfile> {
        self.find_profile(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    /// The scoring projection of a user.
    async fn read_signal(&self, id: UserId) -> AppResult<UserSignal> {
        Ok(self.get_profile(id).await?.signal())
    }
}
