//! Notification delivery: templates, senders, lifecycle logging, retries,
//! and the dispatcher that ties them together.

pub mod delivery;
pub mod dispatcher;
pub mod logger;
pub mod retry;
pub mod sender;
pub mod template;

use std::sync::Arc;

pub use delivery::{recipient_for, ChannelDelivery};
pub use dispatcher::{DispatchRequest, NotificationDispatcher};
pub use logger::{NotificationLogger, STALE_PENDING_ERROR};
pub use retry::{RetryCoordinator, RetryOutcome};
pub use sender::{
    ChannelSender, InAppSender, LogSender, OutgoingMessage, SendError, SendReceipt, SenderRegistry,
};
pub use template::{default_template, RenderedMessage, TemplateRegistry, TemplateRenderer};

use tourhub_core::config::NotificationConfig;
use tourhub_database::Stores;

/// The notification services wired over one set of stores.
#[derive(Debug, Clone)]
pub struct NotificationPipeline {
    /// Lifecycle and statistics.
    pub logger: Arc<NotificationLogger>,
    /// Single send attempts.
    pub delivery: Arc<ChannelDelivery>,
    /// Retry policy.
    pub retry: Arc<RetryCoordinator>,
    /// Channel fan-out.
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl NotificationPipeline {
    /// Wire the pipeline.
    pub fn new(
        stores: &Stores,
        senders: SenderRegistry,
        templates: Arc<dyn TemplateRenderer>,
        config: &NotificationConfig,
    ) -> Self {
        let logger = Arc::new(NotificationLogger::new(
            stores.notifications.clone(),
            config.stats_timezone(),
        ));
        let delivery = Arc::new(ChannelDelivery::new(
            Arc::new(senders),
            stores.users.clone(),
            logger.clone(),
        ));
        let retry = Arc::new(RetryCoordinator::new(
            logger.clone(),
            delivery.clone(),
            config.max_retries,
            config.retry_mode,
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            stores.preferences.clone(),
            templates,
            logger.clone(),
            delivery.clone(),
            retry.clone(),
        ));
        Self {
            logger,
            delivery,
            retry,
            dispatcher,
        }
    }
}
