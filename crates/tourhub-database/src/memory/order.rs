//! In-memory order store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use tourhub_core::types::{OrderId, UserId};
use tourhub_core::{AppError, AppResult};
use tourhub_entity::order::{Classification, ManualPriority, Order};

use crate::store::OrderStore;

/// Orders held in a map behind one lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl MemoryOrderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

fn sorted(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    orders
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> AppResult<Order> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(AppError::conflict(format!("Order {} already exists", order.id)));
        }
        orders.insert(order.id, order.clone());
        Ok(order.clone())
    }

    async fn find_by_id(&self, id: OrderId) -> AppResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[OrderId]) -> AppResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(sorted(ids.iter().filter_map(|id| orders.get(id).cloned()).collect()))
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(sorted(
            orders
                .values()
                .filter(|o| o.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_all(&self) -> AppResult<Vec<Order>> {
        Ok(sorted(self.orders.read().await.values().cloned().collect()))
    }

    async fn write_classification(
        &self,
        id: OrderId,
        classification: &Classification,
        now: DateTime<Utc>,
    ) -> AppResult<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
        if order.priority_overridden {
            return Err(AppError::conflict(format!(
                "Order {id} has a manual priority override"
            )));
        }
        order.apply_classification(*classification, now);
        Ok(order.clone())
    }

    async fn write_classifications(
        &self,
        updates: &[(OrderId, Classification)],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<OrderId>> {
        let mut orders = self.orders.write().await;
        if let Some((missing, _)) = updates.iter().find(|(id, _)| !orders.contains_key(id)) {
            return Err(AppError::not_found(format!("Order {missing} not found")));
        }
        let mut skipped = Vec::new();
        for (id, classification) in updates {
            match orders.get_mut(id) {
                Some(order) if order.priority_overridden => skipped.push(*id),
                Some(order) => order.apply_classification(*classification, now),
                None => {}
            }
        }
        Ok(skipped)
    }

    async fn clear_override(
        &self,
        id: OrderId,
        classification: &Classification,
        now: DateTime<Utc>,
    ) -> AppResult<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
        order.apply_classification(*classification, now);
        Ok(order.clone())
    }

    async fn write_override(
        &self,
        id: OrderId,
        manual: &ManualPriority,
        now: DateTime<Utc>,
    ) -> AppResult<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
        order.apply_override(*manual, now);
        Ok(order.clone())
    }
}
