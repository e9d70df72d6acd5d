//! Bounded in-process dispatch queue.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use tourhub_core::{AppError, AppResult};
use tourhub_service::order::{DispatchHandle, DispatchOutcome, DispatchScheduler, DispatchTask};

/// A queued task together with the sender that completes its handle.
#[derive(Debug)]
pub struct QueuedDispatch {
    /// The work.
    pub task: DispatchTask,
    /// Completes the caller's [`DispatchHandle`].
    pub completion: oneshot::Sender<DispatchOutcome>,
}

/// Producer side of the dispatch queue.
///
/// Cloned into every service that hands off dispatch work.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    sender: mpsc::Sender<QueuedDispatch>,
}

/// Consumer side of the dispatch queue, owned by the worker runner.
#[derive(Debug)]
pub struct DispatchReceiver {
    receiver: mpsc::Receiver<QueuedDispatch>,
}

impl DispatchQueue {
    /// Create a queue holding at most `capacity` waiting tasks.
    pub fn bounded(capacity: usize) -> (Self, DispatchReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, DispatchReceiver { receiver })
    }
}

#[async_trait]
impl DispatchScheduler for DispatchQueue {
    async fn schedule(&self, task: DispatchTask) -> AppResult<DispatchHandle> {
        let task_id = task.id;
        let (completion, handle) = DispatchHandle::channel(task_id);
        self.sender
            .try_send(QueuedDispatch { task, completion })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    AppError::service_unavailable("Dispatch queue is full")
                }
                mpsc::error::TrySendError::Closed(_) => {
                    AppError::service_unavailable("Dispatch queue is closed")
                }
            })?;
        debug!(task_id = %task_id, "Dispatch task queued");
        Ok(handle)
    }
}

impl DispatchReceiver {
    /// Wait for the next task. `None` once every producer is gone or the
    /// queue was closed and drained.
    pub async fn recv(&mut self) -> Option<QueuedDispatch> {
        self.receiver.recv().await
    }

    /// Stop accepting new tasks. Already queued tasks can still be received.
    pub fn close(&mut self) {
        self.receiver.close();
    }

    /// Take a queued task without waiting.
    pub fn try_recv(&mut self) -> Option<QueuedDispatch> {
        self.receiver.try_recv().ok()
    }
}
