//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use tourhub_core::config::AppConfig;
use tourhub_database::DatabasePool;
use tourhub_service::{NotificationPipeline, OrderService};

use crate::middleware::rate_limit::RateLimiter;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL pool, absent when running on the in-memory stores
    pub db: Option<DatabasePool>,
    /// Order use cases
    pub orders: Arc<OrderService>,
    /// Notification logger, retry coordinator, and dispatcher
    pub notifications: NotificationPipeline,
    /// Per-caller rate limiter
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Assemble the state; the rate limiter is built from `config.rate_limit`.
    pub fn new(
        config: AppConfig,
        db: Option<DatabasePool>,
        orders: Arc<OrderService>,
        notifications: NotificationPipeline,
    ) -> Self {
        let rate_limiter = RateLimiter::new(&config.rate_limit);
        Self {
            config: Arc::new(config),
            db,
            orders,
            notifications,
            rate_limiter,
        }
    }
}
