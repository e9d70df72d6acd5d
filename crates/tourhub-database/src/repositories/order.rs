//! Order repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tourhub_core::error::{AppError, ErrorKind};
use tourhub_core::result::AppResult;
use tourhub_core::types::{OrderId, UserId};
use tourhub_entity::order::{Classification, ManualPriority, Order};

use crate::store::OrderStore;

/// Repository for the `orders` table.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

macro_rules! update_classification {
    () => {
        "UPDATE orders SET priority = $2, urgency_level = $3, is_priority = $4, \
         priority_score = $5, priority_overridden = FALSE, updated_at = $6 WHERE id = $1"
    };
}

/// Score-derived writes never replace a manual override.
macro_rules! update_unless_overridden {
    () => {
        concat!(update_classification!(), " AND NOT priority_overridden")
    };
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn insert(&self, order: &Order) -> AppResult<Order> {
        sqlx::query_as::<_, Order>(
            "INSERT INTO orders (id, user_id, total_amount, payment_status, status, booking_date, \
             check_in_date, priority, urgency_level, priority_score, is_priority, priority_overridden, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING *",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.total_amount)
        .bind(order.payment_status)
        .bind(order.status)
        .bind(order.booking_date)
        .bind(order.check_in_date)
        .bind(order.priority)
        .bind(order.urgency_level)
        .bind(order.priority_score)
        .bind(order.is_priority)
        .bind(order.priority_overridden)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create order", e))
    }

    async fn find_by_id(&self, id: OrderId) -> AppResult<Option<Order>> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find order", e))
    }

    async fn find_many(&self, ids: &[OrderId]) -> AppResult<Vec<Order>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE id = ANY($1) ORDER BY created_at, id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find orders", e))
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Order>> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list user orders", e))
    }

    async fn find_all(&self) -> AppResult<Vec<Order>> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list orders", e))
    }

    async fn write_classification(
        &self,
        id: OrderId,
        classification: &Classification,
        now: DateTime<Utc>,
    ) -> AppResult<Order> {
        let updated =
            sqlx::query_as::<_, Order>(concat!(update_unless_overridden!(), " RETURNING *"))
                .bind(id)
                .bind(classification.priority)
                .bind(classification.urgency_level)
                .bind(classification.is_priority)
                .bind(classification.priority_score)
                .bind(now)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to write classification", e)
                })?;

        if let Some(order) = updated {
            return Ok(order);
        }
        match self.find_by_id(id).await? {
            Some(_) => Err(AppError::conflict(format!(
                "Order {id} has a manual priority override"
            ))),
            None => Err(AppError::not_found(format!("Order {id} not found"))),
        }
    }

    async fn write_classifications(
        &self,
        updates: &[(OrderId, Classification)],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<OrderId>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin batch", e))?;

        let mut skipped = Vec::new();
        for (id, classification) in updates {
            let result = sqlx::query(update_unless_overridden!())
                .bind(*id)
                .bind(classification.priority)
                .bind(classification.urgency_level)
                .bind(classification.is_priority)
                .bind(classification.priority_score)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to write classification", e)
                })?;
            if result.rows_affected() > 0 {
                continue;
            }

            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
                    .bind(*id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::with_source(ErrorKind::Database, "Failed to find order", e)
                    })?;
            // Dropping `tx` without commit rolls the whole batch back.
            if !exists {
                return Err(AppError::not_found(format!("Order {id} not found")));
            }
            skipped.push(*id);
        }

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit batch", e))?;
        Ok(skipped)
    }

    async fn clear_override(
        &self,
        id: OrderId,
        classification: &Classification,
        now: DateTime<Utc>,
    ) -> AppResult<Order> {
        sqlx::query_as::<_, Order>(concat!(update_classification!(), " RETURNING *"))
            .bind(id)
            .bind(classification.priority)
            .bind(classification.urgency_level)
            .bind(classification.is_priority)
            .bind(classification.priority_score)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear override", e))?
            .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))
    }

    async fn write_override(
        &self,
        id: OrderId,
        manual: &ManualPriority,
        now: DateTime<Utc>,
    ) -> AppResult<Order> {
        sqlx::query_as::<_, Order>(
            "UPDATE orders SET priority = $2, urgency_level = $3, is_priority = $4, \
             priority_overridden = TRUE, updated_at = $5 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(manual.priority)
        .bind(manual.urgency_level)
        .bind(manual.is_priority)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to write override", e))?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))
    }
}
