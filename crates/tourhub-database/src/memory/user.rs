//! In-memory user directory.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use tourhub_core::types::UserId;
use tourhub_core::AppResult;
use tourhub_entity::user::UserProfile;

use crate::store::UserDirectory;

/// User profiles keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<DashMap<UserId, UserProfile>>,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a profile.
    pub fn upsert(&self, profile: UserProfile) {
        self.users.insert(profile.id, profile);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_profile(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }
}
