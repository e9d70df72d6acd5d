//! In-process store implementations.
//!
//! Used by the test suite and by the `memory` database provider. Orders
//! and notifications sit behind a single `RwLock` each so that batch
//! writes and compare-and-set are atomic with respect to readers.

pub mod notification;
pub mod order;
pub mod preference;
pub mod user;

pub use notification::MemoryNotificationStore;
pub use order::MemoryOrderStore;
pub use preference::MemoryChannelPreferences;
pub use user::MemoryUserDirectory;
