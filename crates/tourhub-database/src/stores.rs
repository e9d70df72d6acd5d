//! Store bundle selected by `database.provider`.

use std::sync::Arc;

use tracing::info;

use tourhub_core::config::{DatabaseConfig, DatabaseProvider};
use tourhub_core::AppResult;

use crate::connection::DatabasePool;
use crate::memory::{
    MemoryChannelPreferences, MemoryNotificationStore, MemoryOrderStore, MemoryUserDirectory,
};
use crate::migration::run_migrations;
use crate::repositories::{
    NotificationRepository, OrderRepository, PreferenceRepository, UserRepository,
};
use crate::store::{ChannelPreferences, NotificationStore, OrderStore, UserDirectory};

/// Every store the services need, behind trait objects.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Orders.
    pub orders: Arc<dyn OrderStore>,
    /// User profiles.
    pub users: Arc<dyn UserDirectory>,
    /// Channel preferences.
    pub preferences: Arc<dyn ChannelPreferences>,
    /// Notification log.
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            orders: Arc::new(OrderRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            preferences: Arc::new(PreferenceRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool)),
        }
    }

    /// Build the stores for the configured provider.
    ///
    /// For PostgreSQL this connects, runs migrations, and also returns the
    /// pool so the caller can close it on shutdown.
    pub async fn from_config(
        config: &DatabaseConfig,
    ) -> AppResult<(Self, Option<DatabasePool>)> {
        match config.provider {
            DatabaseProvider::Postgres => {
                let db = DatabasePool::connect(config).await?;
                run_migrations(db.pool()).await?;
                Ok((Self::postgres(&db), Some(db)))
            }
            DatabaseProvider::Memory => {
                info!("Using in-memory stores; data is lost on restart");
                Ok((MemoryStores::new().stores(), None))
            }
        }
    }
}

/// Concrete in-memory stores, kept typed so tests can seed them.
#[derive(Debug, Clone, Default)]
pub struct MemoryStores {
    /// Orders.
    pub orders: MemoryOrderStore,
    /// User profiles.
    pub users: MemoryUserDirectory,
    /// Channel preferences.
    pub preferences: MemoryChannelPreferences,
    /// Notification log.
    pub notifications: MemoryNotificationStore,
}

impl MemoryStores {
    /// Fresh, empty stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Share these stores behind trait objects.
    pub fn stores(&self) -> Stores {
        Stores {
            orders: Arc::new(self.orders.clone()),
            users: Arc::new(self.users.clone()),
            preferences: Arc::new(self.preferences.clone()),
            notifications: Arc::new(self.notifications.clone()),
        }
    }
}
