//! Order creation, classification, batch rescoring, and manual overrides.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use tourhub_core::types::{OrderId, UserId};
use tourhub_core::{AppError, AppResult};
use tourhub_database::store::{OrderStore, UserDirectory};
use tourhub_entity::notification::{BookingDetails, NotificationPriority};
use tourhub_entity::order::{Classification, ManualPriority, NewOrder, Order};
use tourhub_entity::user::UserSignal;

use crate::context::AuthContext;
use crate::notification::{DispatchRequest, NotificationDispatcher};
use crate::priority::{OrderSnapshot, PriorityClassifier};

use super::scheduler::{DispatchHandle, DispatchScheduler, DispatchTask, SpawnScheduler};

/// A persisted order and the pending dispatch of its confirmation.
#[derive(Debug)]
pub struct OrderCreated {
    /// The stored order, classification included.
    pub order: Order,
    /// Resolves when the confirmation dispatch finishes.
    pub dispatch: DispatchHandle,
}

/// Which orders a batch rescore covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "order_ids", rename_all = "snake_case")]
pub enum RescoreScope {
    /// An explicit set of orders.
    Orders(Vec<OrderId>),
    /// Every order owned by the caller.
    Mine,
    /// Every order. The caller must have checked authorization.
    All,
}

/// What a rescore did to one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescoreResult {
    /// The order.
    pub order_id: OrderId,
    /// Classification before the rescore.
    pub previous: Classification,
    /// Classification after the rescore.
    pub classification: Classification,
    /// Whether the stored classification changed.
    pub changed: bool,
    /// Whether the order was skipped because of a manual override.
    pub skipped_override: bool,
}

/// Order use cases.
#[derive(Debug, Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
    classifier: PriorityClassifier,
    scheduler: Arc<dyn DispatchScheduler>,
    fallback: SpawnScheduler,
}

impl OrderService {
    /// Create an order service.
    ///
    /// Confirmations go through `scheduler`. When it refuses a task, the
    /// task runs on its own spawned task through `dispatcher` instead.
    pub fn new(
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserDirectory>,
        classifier: PriorityClassifier,
        scheduler: Arc<dyn DispatchScheduler>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            orders,
            users,
            classifier,
            scheduler,
            fallback: SpawnScheduler::new(dispatcher),
        }
    }

    /// Validate, classify, and persist an order, then schedule its confirmation.
    ///
    /// The result depends only on the order store. A confirmation the
    /// scheduler refuses is dispatched on a spawned task, so it still
    /// leaves Notification records behind.
    pub async fn create_order(
        &self,
        ctx: &AuthContext,
        new: NewOrder,
        details: BookingDetails,
    ) -> AppResult<OrderCreated> {
        ctx.require_owner(new.user_id)?;
        new.validate()?;
        details
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid booking details: {e}")))?;

        let signal = self.users.read_signal(new.user_id).await?;
        let now = Utc::now();
        let classification = self
            .classifier
            .classify(&OrderSnapshot::from(&new), &signal, now)?;
        let order = self
            .orders
            .insert(&Order::from_new(new, classification, now))
            .await?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            priority = %order.priority,
            priority_score = order.priority_score,
            "Order created"
        );

        let task = DispatchTask::new(DispatchRequest::booking_confirmation(
            order.user_id,
            order.id,
            NotificationPriority::from(order.priority),
            details,
        ));
        let task_id = task.id;
        let dispatch = match self.scheduler.schedule(task.clone()).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(
                    order_id = %order.id,
                    task_id = %task_id,
                    error = %e,
                    "Booking confirmation refused by scheduler, dispatching on a spawned task"
                );
                self.fallback
                    .schedule(task)
                    .await
                    .unwrap_or_else(|e| DispatchHandle::completed(task_id, Err(e)))
            }
        };

        Ok(OrderCreated { order, dispatch })
    }

    /// Load an order the caller may see.
    pub async fn get_order(&self, ctx: &AuthContext, id: OrderId) -> AppResult<Order> {
        let order = self.orders.get(id).await?;
        ctx.require_owner(order.user_id)?;
        Ok(order)
    }

    /// Recompute and store the classification of one order.
    ///
    /// Overridden orders are a `Conflict`; clear the override first. The
    /// store re-checks the override at write time, so one that lands
    /// after the read is kept and also reported as a `Conflict`.
    pub async fn reclassify(&self, ctx: &AuthContext, id: OrderId) -> AppResult<Classification> {
        let order = self.get_order(ctx, id).await?;
        if order.priority_overridden {
            return Err(AppError::conflict(format!(
                "Order {id} has a manual priority override"
            )));
        }

        let signal = self.users.read_signal(order.user_id).await?;
        let now = Utc::now();
        let classification =
            self.classifier
                .classify(&OrderSnapshot::from(&order), &signal, now)?;
        if classification != order.classification() {
            self.orders
                .write_classification(id, &classification, now)
                .await?;
            info!(
                order_id = %id,
                from = %order.priority,
                to = %classification.priority,
                "Order reclassified"
            );
        }
        Ok(classification)
    }

    /// Re-evaluate many orders and store every change as one batch.
    ///
    /// All orders are loaded and scored before anything is written, so a
    /// missing order or user leaves the store untouched. Running it twice
    /// in a row writes nothing the second time. Orders overridden before
    /// the batch is written are reported as skipped, never overwritten.
    pub async fn rescore(
        &self,
        ctx: &AuthContext,
        scope: RescoreScope,
    ) -> AppResult<Vec<RescoreResult>> {
        let orders = match scope {
            RescoreScope::Orders(ids) => {
                let unique: BTreeSet<OrderId> = ids.into_iter().collect();
                let ids: Vec<OrderId> = unique.iter().copied().collect();
                let found = self.orders.find_many(&ids).await?;
                if let Some(missing) = ids.iter().find(|id| !found.iter().any(|o| o.id == **id)) {
                    return Err(AppError::not_found(format!("Order {missing} not found")));
                }
                for order in &found {
                    ctx.require_owner(order.user_id)?;
                }
                found
            }
            RescoreScope::Mine => self.orders.find_by_user(ctx.user_id).await?,
            RescoreScope::All => self.orders.find_all().await?,
        };

        let now = Utc::now();
        let mut signals: HashMap<UserId, UserSignal> = HashMap::new();
        let mut results = Vec::with_capacity(orders.len());
        let mut updates = Vec::new();

        for order in &orders {
            let previous = order.classification();
            if order.priority_overridden {
                results.push(RescoreResult {
                    order_id: order.id,
                    previous,
                    classification: previous,
                    changed: false,
                    skipped_override: true,
                });
                continue;
            }

            let signal = match signals.get(&order.user_id) {
                Some(signal) => *signal,
                None => {
                    let signal = self.users.read_signal(order.user_id).await?;
                    signals.insert(order.user_id, signal);
                    signal
                }
            };
            let classification =
                self.classifier
                    .classify(&OrderSnapshot::from(order), &signal, now)?;
            let changed = classification != previous;
            if changed {
                updates.push((order.id, classification));
            }
            results.push(RescoreResult {
                order_id: order.id,
                previous,
                classification,
                changed,
                skipped_override: false,
            });
        }

        let skipped = if updates.is_empty() {
            Vec::new()
        } else {
            self.orders.write_classifications(&updates, now).await?
        };
        // Overrides that landed after the read win over the fresh score.
        for result in results.iter_mut().filter(|r| skipped.contains(&r.order_id)) {
            result.classification = result.previous;
            result.changed = false;
            result.skipped_override = true;
        }
        info!(
            processed = results.len(),
            changed = updates.len() - skipped.len(),
            skipped_late_override = skipped.len(),
            "Batch rescore finished"
        );
        Ok(results)
    }

    /// Replace an order's tier by hand. The score is kept.
    pub async fn override_priority(
        &self,
        ctx: &AuthContext,
        id: OrderId,
        manual: ManualPriority,
    ) -> AppResult<Order> {
        ctx.require_admin()?;
        let order = self.orders.write_override(id, &manual, Utc::now()).await?;
        info!(
            order_id = %id,
            priority = %order.priority,
            urgency_level = %order.urgency_level,
            by = %ctx.user_id,
            "Order priority overridden"
        );
        Ok(order)
    }

    /// Drop a manual override and re-derive the tier from a fresh score.
    pub async fn clear_override(&self, ctx: &AuthContext, id: OrderId) -> AppResult<Order> {
        ctx.require_admin()?;
        let order = self.orders.get(id).await?;
        let signal = self.users.read_signal(order.user_id).await?;
        let now = Utc::now();
        let classification =
            self.classifier
                .classify(&OrderSnapshot::from(&order), &signal, now)?;
        let order = self.orders.clear_override(id, &classification, now).await?;
        info!(order_id = %id, priority = %order.priority, "Order priority override cleared");
        Ok(order)
    }
}
