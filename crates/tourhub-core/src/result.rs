//! Convenience result type alias for TourHub.

use crate::error::AppError;

/// A specialized `Result` type for TourHub operations.
pub type AppResult<T> = Result<T, AppError>;
