//! Channel sender capability and the built-in senders.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use tourhub_core::types::NotificationId;
use tourhub_entity::notification::{NotificationChannel, NotificationPayload};

/// A rendered message ready for one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Record this attempt belongs to.
    pub notification_id: NotificationId,
    /// Target channel.
    pub channel: NotificationChannel,
    /// Channel address: email, phone number, push token, or user id.
    pub recipient: String,
    /// Rendered title.
    pub title: String,
    /// Rendered body.
    pub content: String,
    /// Structured payload.
    pub metadata: NotificationPayload,
}

/// What a channel reported on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Whether delivery was confirmed synchronously.
    pub delivered: bool,
    /// Gateway message id, if the channel returns one.
    pub provider_message_id: Option<String>,
}

impl SendReceipt {
    /// Accepted, delivery not yet confirmed.
    pub fn accepted() -> Self {
        Self::default()
    }

    /// Accepted and confirmed delivered.
    pub fn delivered() -> Self {
        Self {
            delivered: true,
            provider_message_id: None,
        }
    }
}

/// A channel failure. Always recovered into a FAILED record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// May succeed if tried again.
    #[error("transient failure: {0}")]
    Transient(String),
    /// Will fail the same way on every attempt.
    #[error("rejected: {0}")]
    Permanent(String),
    /// The channel could not be reached.
    #[error("channel unavailable: {0}")]
    Unavailable(String),
}

impl SendError {
    /// Whether automatic retries should skip this failure.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
}

/// Delivers messages on one channel.
#[async_trait]
pub trait ChannelSender: Send + Sync + std::fmt::Debug {
    /// The channel this sender serves.
    fn channel(&self) -> NotificationChannel;

    /// Attempt delivery.
    async fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, SendError>;
}

/// Senders keyed by channel.
#[derive(Debug, Clone, Default)]
pub struct SenderRegistry {
    senders: HashMap<NotificationChannel, Arc<dyn ChannelSender>>,
}

impl SenderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// In-app delivery plus logging stand-ins for the external gateways.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(InAppSender));
        for channel in [
            NotificationChannel::Email,
            NotificationChannel::Sms,
            NotificationChannel::Push,
        ] {
            registry.register(Arc::new(LogSender::new(channel)));
        }
        registry
    }

    /// Add or replace the sender for its channel.
    pub fn register(&mut self, sender: Arc<dyn ChannelSender>) {
        self.senders.insert(sender.channel(), sender);
    }

    /// The sender for `channel`.
    pub fn get(&self, channel: NotificationChannel) -> Option<Arc<dyn ChannelSender>> {
        self.senders.get(&channel).cloned()
    }
}

/// In-app notifications are the stored record itself, so delivery is immediate.
#[derive(Debug, Clone, Copy, Default)]
pub struct InAppSender;

#[async_trait]
impl ChannelSender for InAppSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::InApp
    }

    async fn send(&self, _message: &OutgoingMessage) -> Result<SendReceipt, SendError> {
        Ok(SendReceipt::delivered())
    }
}

/// Logs the message instead of calling a gateway.
#[derive(Debug, Clone, Copy)]
pub struct LogSender {
    channel: NotificationChannel,
}

impl LogSender {
    /// A logging sender for `channel`.
    pub fn new(channel: NotificationChannel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl ChannelSender for LogSender {
    fn channel(&self) -> NotificationChannel {
        self.channel
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<SendReceipt, SendError> {
        info!(
            notification_id = %message.notification_id,
            channel = %self.channel,
            recipient = %message.recipient,
            title = %message.title,
            "Outgoing notification (log sender)"
        );
        Ok(SendReceipt::accepted())
    }
}
