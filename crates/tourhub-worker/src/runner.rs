//! Worker runner: drains the dispatch queue with bounded concurrency.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};

use tourhub_core::config::WorkerConfig;
use tourhub_service::NotificationDispatcher;

use crate::queue::{DispatchReceiver, QueuedDispatch};

/// Runs queued dispatch tasks until shutdown.
#[derive(Debug)]
pub struct WorkerRunner {
    dispatcher: Arc<NotificationDispatcher>,
    config: WorkerConfig,
    worker_id: String,
}

impl WorkerRunner {
    /// Create a worker runner.
    pub fn new(
        dispatcher: Arc<NotificationDispatcher>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            dispatcher,
            config,
            worker_id,
        }
    }

    /// Process tasks until `cancel` turns true or every producer is gone.
    ///
    /// On shutdown the queue stops accepting work, tasks already queued are
    /// still dispatched, and in-flight tasks get `drain_timeout_seconds` to
    /// finish.
    pub async fn run(&self, mut receiver: DispatchReceiver, mut cancel: watch::Receiver<bool>) {
        let concurrency = self.config.concurrency.max(1);
        info!(
            worker_id = %self.worker_id,
            concurrency,
            "Dispatch worker started"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        info!(worker_id = %self.worker_id, "Dispatch worker received shutdown signal");
                        break;
                    }
                }
                next = receiver.recv() => {
                    match next {
                        Some(queued) => self.spawn(queued, &semaphore).await,
                        None => {
                            info!(worker_id = %self.worker_id, "Dispatch queue closed");
                            break;
                        }
                    }
                }
            }
        }

        receiver.close();
        let mut drained = 0usize;
        while let Some(queued) = receiver.try_recv() {
            self.spawn(queued, &semaphore).await;
            drained += 1;
        }
        info!(
            worker_id = %self.worker_id,
            drained,
            "Waiting for in-flight dispatch tasks"
        );

        let drain_timeout = Duration::from_secs(self.config.drain_timeout_seconds);
        let permits = u32::try_from(concurrency).unwrap_or(u32::MAX);
        match tokio::time::timeout(drain_timeout, semaphore.acquire_many(permits)).await {
            Ok(_) => info!(worker_id = %self.worker_id, "Dispatch worker shut down"),
            Err(_) => warn!(
                worker_id = %self.worker_id,
                timeout_seconds = self.config.drain_timeout_seconds,
                "Dispatch worker shut down with tasks still running"
            ),
        }
    }

    async fn spawn(&self, queued: QueuedDispatch, semaphore: &Arc<Semaphore>) {
        let permit = match Arc::clone(semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(task_id = %queued.task.id, error = %e, "Worker semaphore closed");
                return;
            }
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let _permit = permit;
            let QueuedDispatch { task, completion } = queued;
            let task_id = task.id;
            let order_id = task.request.order_id;

            let outcome = dispatcher.dispatch(task.request).await;
            match &outcome {
                Ok(records) => debug!(
                    task_id = %task_id,
                    notifications = records.len(),
                    "Dispatch task finished"
                ),
                Err(e) => warn!(
                    task_id = %task_id,
                    order_id = ?order_id,
                    error = %e,
                    "Dispatch task failed"
                ),
            }
            // The caller may have dropped its handle.
            let _ = completion.send(outcome);
        });
    }
}
