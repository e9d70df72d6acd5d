//! User projections used for scoring and recipient resolution.

pub mod model;
pub mod role;

pub use model::{UserProfile, UserSignal};
pub use role::UserRole;
