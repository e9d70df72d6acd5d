//! Handing notification dispatch off from the request that triggered it.
//!
//! Persisting an order and dispatching its notifications are two
//! separately observable steps. The order path hands a [`DispatchTask`] to
//! a [`DispatchScheduler`] and gets a [`DispatchHandle`] back that
//! resolves once the dispatch has finished.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use tourhub_core::{AppError, AppResult};
use tourhub_entity::notification::Notification;

use crate::notification::{DispatchRequest, NotificationDispatcher};

/// A unit of dispatch work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchTask {
    /// Task identifier, for logs.
    pub id: Uuid,
    /// What to dispatch.
    pub request: DispatchRequest,
}

impl DispatchTask {
    /// Wrap a request in a new task.
    pub fn new(request: DispatchRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
        }
    }
}

/// Result delivered through a [`DispatchHandle`].
pub type DispatchOutcome = AppResult<Vec<Notification>>;

/// Completion signal for one dispatch task.
#[derive(Debug)]
pub struct DispatchHandle {
    task_id: Uuid,
    receiver: oneshot::Receiver<DispatchOutcome>,
}

impl DispatchHandle {
    /// A handle and the sender that completes it.
    pub fn channel(task_id: Uuid) -> (oneshot::Sender<DispatchOutcome>, Self) {
        let (tx, receiver) = oneshot::channel();
        (tx, Self { task_id, receiver })
    }

    /// A handle that is already complete.
    pub fn completed(task_id: Uuid, outcome: DispatchOutcome) -> Self {
        let (tx, handle) = Self::channel(task_id);
        let _ = tx.send(outcome);
        handle
    }

    /// The task this handle tracks.
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// Wait for the dispatch to finish.
    ///
    /// Dropping the handle instead does not cancel the dispatch.
    pub async fn wait(self) -> DispatchOutcome {
        let task_id = self.task_id;
        self.receiver.await.map_err(|_| {
            AppError::service_unavailable(format!(
                "Dispatch task {task_id} was dropped before completing"
            ))
        })?
    }
}

/// Accepts dispatch tasks for execution.
#[async_trait]
pub trait DispatchScheduler: Send + Sync + std::fmt::Debug {
    /// Accept `task`. Fails only if the task could not be accepted at all.
    async fn schedule(&self, task: DispatchTask) -> AppResult<DispatchHandle>;
}

/// Runs each task to completion inside `schedule`.
///
/// Deterministic; used by tests and by deployments without a worker.
#[derive(Debug, Clone)]
pub struct InlineScheduler {
    dispatcher: Arc<NotificationDispatcher>,
}

impl InlineScheduler {
    /// Create an inline scheduler.
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl DispatchScheduler for InlineScheduler {
    async fn schedule(&self, task: DispatchTask) -> AppResult<DispatchHandle> {
        let outcome = self.dispatcher.dispatch(task.request).await;
        Ok(DispatchHandle::completed(task.id, outcome))
    }
}

/// Runs each task on its own spawned tokio task.
///
/// Never refuses work, so it backs schedulers that can.
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    dispatcher: Arc<NotificationDispatcher>,
}

impl SpawnScheduler {
    /// Create a spawning scheduler.
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl DispatchScheduler for SpawnScheduler {
    async fn schedule(&self, task: DispatchTask) -> AppResult<DispatchHandle> {
        let (completion, handle) = DispatchHandle::channel(task.id);
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let outcome = dispatcher.dispatch(task.request).await;
            // The caller may have dropped the handle.
            let _ = completion.send(outcome);
        });
        Ok(handle)
    }
}
