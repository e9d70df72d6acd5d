//! Notification domain entities.

pub mod filter;
pub mod model;
pub mod payload;
pub mod stats;
pub mod status;

pub use filter::NotificationFilter;
pub use model::{NewNotification, Notification};
pub use payload::{BookingDetails, NotificationPayload, ServiceKind};
pub use stats::{DailyStats, DeliveryBreakdown, NotificationStats, StatusCountRow};
pub use status::{NotificationChannel, NotificationPriority, NotificationStatus, NotificationType};
