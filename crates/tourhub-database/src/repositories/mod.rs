//! PostgreSQL implementations of the store traits.

pub mod notification;
pub mod order;
pub mod preference;
pub mod user;

pub use notification::NotificationRepository;
pub use order::OrderRepository;
pub use preference::PreferenceRepository;
pub use user::UserRepository;
