//! Fan-out of one notification event to the user's enabled channels.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use validator::Validate;

use tourhub_core::types::{OrderId, UserId};
use tourhub_core::{AppError, AppResult};
use tourhub_database::store::ChannelPreferences;
use tourhub_entity::notification::{
    BookingDetails, NewNotification, Notification, NotificationChannel, NotificationPayload,
    NotificationPriority, NotificationStatus, NotificationType,
};

use super::delivery::ChannelDelivery;
use super::logger::NotificationLogger;
use super::retry::RetryCoordinator;
use super::template::{default_template, TemplateRenderer};

/// One notification event to deliver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Recipient.
    pub user_id: UserId,
    /// Related order.
    pub order_id: Option<OrderId>,
    /// Notification-level priority.
    pub priority: NotificationPriority,
    /// Template to render; defaults to the payload type's template.
    pub template: Option<String>,
    /// Typed payload.
    pub payload: NotificationPayload,
    /// Extra template variables, applied over the payload's own.
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

impl DispatchRequest {
    /// A request with the default template and no extra variables.
    pub fn new(
        user_id: UserId,
        order_id: Option<OrderId>,
        priority: NotificationPriority,
        payload: NotificationPayload,
    ) -> Self {
        Self {
            user_id,
            order_id,
            priority,
            template: None,
            payload,
            variables: HashMap::new(),
        }
    }

    /// A booking confirmation for `order_id`.
    pub fn booking_confirmation(
        user_id: UserId,
        order_id: OrderId,
        priority: NotificationPriority,
        details: BookingDetails,
    ) -> Self {
        Self::new(
            user_id,
            Some(order_id),
            priority,
            NotificationPayload::OrderConfirmed(details),
        )
    }

    /// The notification type implied by the payload.
    pub fn notification_type(&self) -> NotificationType {
        self.payload.notification_type()
    }

    fn template_name(&self) -> &str {
        self.template
            .as_deref()
            .unwrap_or_else(|| default_template(self.notification_type()))
    }
}

/// Creates one record per enabled channel and drives each through a send.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    preferences: Arc<dyn ChannelPreferences>,
    templates: Arc<dyn TemplateRenderer>,
    logger: Arc<NotificationLogger>,
    delivery: Arc<ChannelDelivery>,
    retry: Arc<RetryCoordinator>,
}

impl NotificationDispatcher {
    /// Create a dispatcher.
    pub fn new(
        preferences: Arc<dyn ChannelPreferences>,
        templates: Arc<dyn TemplateRenderer>,
        logger: Arc<NotificationLogger>,
        delivery: Arc<ChannelDelivery>,
        retry: Arc<RetryCoordinator>,
    ) -> Self {
        Self {
            preferences,
            templates,
            logger,
            delivery,
            retry,
        }
    }

    /// Send a booking confirmation on every channel the user enabled.
    pub async fn send_booking_confirmation(
        &self,
        user_id: UserId,
        order_id: OrderId,
        priority: NotificationPriority,
        details: BookingDetails,
    ) -> AppResult<Vec<Notification>> {
        self.dispatch(DispatchRequest::booking_confirmation(
            user_id, order_id, priority, details,
        ))
        .await
    }

    /// Deliver `request` and return the records it produced.
    ///
    /// Input and template problems fail before anything is written. After
    /// that, channel failures end up on the records themselves and a
    /// persistence error on one channel does not stop the others.
    pub async fn dispatch(&self, request: DispatchRequest) -> AppResult<Vec<Notification>> {
        if let NotificationPayload::OrderConfirmed(details) = &request.payload {
            details
                .validate()
                .map_err(|e| AppError::validation(format!("Invalid booking details: {e}")))?;
        }

        let notification_type = request.notification_type();
        let mut variables = request.payload.template_variables();
        variables.extend(request.variables.clone());
        let rendered = self.templates.render(request.template_name(), &variables)?;

        let channels = self
            .resolve_channels(request.user_id, notification_type)
            .await;

        let mut records = Vec::with_capacity(channels.len());
        for channel in channels {
            let new = NewNotification {
                user_id: request.user_id,
                order_id: request.order_id,
                channel,
                priority: request.priority,
                title: rendered.title.clone(),
                content: rendered.content.clone(),
                metadata: request.payload.clone(),
            };
            match self.deliver(new).await {
                Ok(n) => records.push(n),
                Err(e) => error!(
                    user_id = %request.user_id,
                    channel = %channel,
                    notification_type = %notification_type,
                    error = %e,
                    "Notification dispatch failed on channel"
                ),
            }
        }

        info!(
            user_id = %request.user_id,
            notification_type = %notification_type,
            records = records.len(),
            failed = records
                .iter()
                .filter(|n| n.status == NotificationStatus::Failed)
                .count(),
            "Notification dispatched"
        );
        Ok(records)
    }

    async fn deliver(&self, new: NewNotification) -> AppResult<Notification> {
        let pending = self.logger.log(new).await?;
        let attempted = self.delivery.attempt(pending).await?;
        if attempted.status == NotificationStatus::Failed {
            return self.retry.handle_failure(attempted).await;
        }
        Ok(attempted)
    }

    /// Enabled channels, deduplicated; IN_APP when resolution fails or is empty.
    async fn resolve_channels(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
    ) -> Vec<NotificationChannel> {
        let mut channels = match self
            .preferences
            .enabled_channels(user_id, notification_type)
            .await
        {
            Ok(channels) => channels,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    notification_type = %notification_type,
                    error = %e,
                    "Channel preferences unavailable, falling back to in-app"
                );
                Vec::new()
            }
        };

        let mut seen = Vec::with_capacity(channels.len());
        channels.retain(|c| {
            if seen.contains(c) {
                false
            } else {
                seen.push(*c);
                true
            }
        });

        if channels.is_empty() {
            channels.push(NotificationChannel::InApp);
        }
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tourhub_core::config::{NotificationConfig, RetryMode};
    use tourhub_database::MemoryStores;
    use tourhub_entity::user::UserRole;

    use crate::notification::sender::{SendError, SendReceipt, SenderRegistry};
    use crate::notification::template::TemplateRegistry;
    use crate::notification::testing::{booking, profile, ScriptedSender};
    use crate::notification::NotificationPipeline;

    fn pipeline(mem: &MemoryStores, senders: SenderRegistry) -> NotificationPipeline {
        let config = NotificationConfig {
            retry_mode: RetryMode::Deferred,
            ..Default::default()
        };
        NotificationPipeline::new(
            &mem.stores(),
            senders,
            Arc::new(TemplateRegistry::with_builtin()),
            &config,
        )
    }

    #[tokio::test]
    async fn test_one_record_per_enabled_channel() {
        let mem = MemoryStores::new();
        let user = profile(UserRole::User, 0);
        mem.users.upsert(user.clone());
        mem.preferences
            .set_channels(
                user.id,
                NotificationType::OrderConfirmed,
                &[NotificationChannel::Email, NotificationChannel::Sms],
            )
            .await
            .unwrap();

        let mut senders = SenderRegistry::with_defaults();
        senders.register(ScriptedSender::new(
            NotificationChannel::Email,
            Ok(SendReceipt::accepted()),
        ));
        senders.register(ScriptedSender::new(
            NotificationChannel::Sms,
            Err(SendError::Transient("carrier rejected".into())),
        ));
        let p = pipeline(&mem, senders);

        let records = p
            .dispatcher
            .send_booking_confirmation(
                user.id,
                OrderId::new(),
                NotificationPriority::High,
                booking(),
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        let email = records
            .iter()
            .find(|n| n.channel == NotificationChannel::Email)
            .unwrap();
        assert_eq!(email.status, NotificationStatus::Sent);
        assert!(email.title.contains("Sunset Kayak Tour"));
        assert!(email.content.contains("TH-0001"));

        let sms = records
            .iter()
            .find(|n| n.channel == NotificationChannel::Sms)
            .unwrap();
        assert_eq!(sms.status, NotificationStatus::Failed);
        assert!(!sms.error_message.as_deref().unwrap_or_default().is_empty());
        assert_eq!(mem.notifications.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_falls_back_to_in_app_without_preferences() {
        let mem = MemoryStores::new();
        let user = profile(UserRole::User, 0);
        mem.users.upsert(user.clone());
        let p = pipeline(&mem, SenderRegistry::with_defaults());

        let records = p
            .dispatcher
            .dispatch(DispatchRequest::new(
                user.id,
                None,
                NotificationPriority::Low,
                NotificationPayload::SystemAnnouncement { link: None },
            ))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channel, NotificationChannel::InApp);
        assert_eq!(records[0].status, NotificationStatus::Delivered);
    }

    #[derive(Debug)]
    struct BrokenPreferences;

    #[async_trait]
    impl ChannelPreferences for BrokenPreferences {
        async fn enabled_channels(
            &self,
            _user_id: UserId,
            _notification_type: NotificationType,
        ) -> AppResult<Vec<NotificationChannel>> {
            Err(AppError::database("preferences table unavailable"))
        }

        async fn set_channels(
            &self,
            _user_id: UserId,
            _notification_type: NotificationType,
            _channels: &[NotificationChannel],
        ) -> AppResult<()> {
            Err(AppError::database("preferences table unavailable"))
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_in_app_when_preferences_fail() {
        let mem = MemoryStores::new();
        let user = profile(UserRole::User, 0);
        mem.users.upsert(user.clone());
        let mut stores = mem.stores();
        stores.preferences = Arc::new(BrokenPreferences);
        let p = NotificationPipeline::new(
            &stores,
            SenderRegistry::with_defaults(),
            Arc::new(TemplateRegistry::with_builtin()),
            &NotificationConfig::default(),
        );

        let records = p
            .dispatcher
            .send_booking_confirmation(user.id, OrderId::new(), NotificationPriority::Normal, booking())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channel, NotificationChannel::InApp);
    }

    #[tokio::test]
    async fn test_missing_address_is_permanent_failure() {
        let mem = MemoryStores::new();
        let user = profile(UserRole::User, 0);
        mem.users.upsert(user.clone());
        mem.preferences
            .set_channels(user.id, NotificationType::OrderConfirmed, &[NotificationChannel::Push])
            .await
            .unwrap();
        let p = pipeline(&mem, SenderRegistry::with_defaults());

        let records = p
            .dispatcher
            .send_booking_confirmation(user.id, OrderId::new(), NotificationPriority::Normal, booking())
            .await
            .unwrap();
        assert_eq!(records[0].status, NotificationStatus::Failed);
        assert!(!records[0].retryable);
    }

    #[tokio::test]
    async fn test_invalid_details_write_nothing() {
        let mem = MemoryStores::new();
        let user = profile(UserRole::User, 0);
        mem.users.upsert(user.clone());
        let p = pipeline(&mem, SenderRegistry::with_defaults());

        let mut details = booking();
        details.confirmation_number.clear();
        let err = p
            .dispatcher
            .send_booking_confirmation(user.id, OrderId::new(), NotificationPriority::Normal, details)
            .await
            .unwrap_err();
        assert_eq!(err.kind, tourhub_core::ErrorKind::Validation);
        assert!(mem.notifications.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_template_writes_nothing() {
        let mem = MemoryStores::new();
        let user = profile(UserRole::User, 0);
        mem.users.upsert(user.clone());
        let p = pipeline(&mem, SenderRegistry::with_defaults());

        let mut request = DispatchRequest::new(
            user.id,
            None,
            NotificationPriority::Normal,
            NotificationPayload::SystemAnnouncement { link: None },
        );
        request.template = Some("does_not_exist".into());
        let err = p.dispatcher.dispatch(request).await.unwrap_err();
        assert_eq!(err.kind, tourhub_core::ErrorKind::NotFound);
        assert!(mem.notifications.all().await.is_empty());
    }
}
