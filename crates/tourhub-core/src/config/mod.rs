//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod database;
pub mod logging;
pub mod notification;
pub mod rate_limit;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::database::{DatabaseConfig, DatabaseProvider};
pub use self::logging::LoggingConfig;
pub use self::notification::{NotificationConfig, RetryMode};
pub use self::rate_limit::RateLimitConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Notification delivery, retry, and retention settings.
    #[serde(default)]
    pub notification: NotificationConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Per-caller request rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `TOURHUB_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TOURHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject settings that would make the notification pipeline misbehave.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.notification.retention_days <= 0 {
            return Err(AppError::configuration(
                "notification.retention_days must be positive",
            ));
        }
        if self.notification.stats_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(AppError::configuration(
                "notification.stats_utc_offset_minutes must be within one day",
            ));
        }
        if self.worker.concurrency == 0 {
            return Err(AppError::configuration("worker.concurrency must be at least 1"));
        }
        if self.worker.queue_capacity == 0 {
            return Err(AppError::configuration(
                "worker.queue_capacity must be at least 1",
            ));
        }
        if self.database.provider == DatabaseProvider::Postgres && self.database.url.is_empty() {
            return Err(AppError::configuration(
                "database.url is required for the postgres provider",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.notification.max_retries, 3);
        assert_eq!(config.notification.retry_mode, RetryMode::Inline);
    }

    #[test]
    fn test_rejects_non_positive_retention() {
        let mut config = AppConfig::default();
        config.notification.retention_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = AppConfig::default();
        config.database.provider = DatabaseProvider::Postgres;
        config.database.url.clear();
        assert!(config.validate().is_err());
    }
}
