//! Booking order domain entities.

pub mod model;
pub mod priority;
pub mod status;

pub use model::{NewOrder, Order};
pub use priority::{Classification, ManualPriority, OrderPriority, UrgencyLevel};
pub use status::{OrderStatus, PaymentStatus};
