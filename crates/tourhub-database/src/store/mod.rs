//! Collaborator traits the booking core reads and writes through.

pub mod notification;
pub mod order;
pub mod preference;
pub mod user;

pub use notification::NotificationStore;
pub use order::OrderStore;
pub use preference::ChannelPreferences;
pub use user::UserDirectory;
