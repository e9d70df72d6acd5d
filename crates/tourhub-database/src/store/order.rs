//! Order persistence trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tourhub_core::types::{OrderId, UserId};
use tourhub_core::{AppError, AppResult};
use tourhub_entity::order::{Classification, ManualPriority, Order};

/// Persists order records. The core only writes the classification fields.
#[async_trait]
pub trait OrderStore: Send + Sync + std::fmt::Debug {
    /// Insert a new order.
    async fn insert(&self, order: &Order) -> AppResult<Order>;

    /// Find an order by id.
    async fn find_by_id(&self, id: OrderId) -> AppResult<Option<Order>>;

    /// Find every order in `ids`. Missing ids are simply absent from the result.
    async fn find_many(&self, ids: &[OrderId]) -> AppResult<Vec<Order>>;

    /// All orders owned by `user_id`.
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Order>>;

    /// Every order.
    async fn find_all(&self) -> AppResult<Vec<Order>>;

    /// Persist a score-derived classification.
    ///
    /// The write only applies while the order carries no manual override;
    /// an overridden order is left untouched and reported as a `Conflict`.
    async fn write_classification(
        &self,
        id: OrderId,
        classification: &Classification,
        now: DateTime<Utc>,
    ) -> AppResult<Order>;

    /// Persist many score-derived classifications as one atomic batch.
    ///
    /// A missing order fails the batch and nothing is applied; readers
    /// never observe a partially applied batch. Orders that carry a manual
    /// override when the batch runs are skipped, and their ids returned.
    async fn write_classifications(
        &self,
        updates: &[(OrderId, Classification)],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<OrderId>>;

    /// Drop a manual override and store `classification` in its place.
    async fn clear_override(
        &self,
        id: OrderId,
        classification: &Classification,
        now: DateTime<Utc>,
    ) -> AppResult<Order>;

    /// Persist an operator override, leaving the score untouched.
    async fn write_override(
        &self,
        id: OrderId,
        manual: &ManualPriority,
        now: DateTime<Utc>,
    ) -> AppResult<Order>;

    /// Load an order or fail with `NotFound`.
    async fn get(&self, id: OrderId) -> AppResult<Order> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))
    }
}
