//! Response DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tourhub_entity::order::Order;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Backing store: `postgres` or `memory`.
    pub store: String,
}

/// A newly created order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    /// The persisted order with its classification.
    pub order: Order,
    /// Identifier of the confirmation dispatch task.
    pub dispatch_task_id: Uuid,
}

/// Result of a retention cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    /// Records deleted.
    pub deleted: u64,
    /// Retention that was applied.
    pub retention_days: i64,
}
