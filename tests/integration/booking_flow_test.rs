//! End-to-end booking flows: classification, confirmation dispatch,
//! retries, statistics, and retention.

mod helpers;

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use tourhub_core::ErrorKind;
use tourhub_database::store::{ChannelPreferences, OrderStore};
use tourhub_entity::notification::{
    NewNotification, NotificationChannel, NotificationFilter, NotificationPayload,
    NotificationPriority, NotificationStatus, NotificationType,
};
use tourhub_entity::order::{NewOrder, OrderPriority, OrderStatus, PaymentStatus, UrgencyLevel};
use tourhub_entity::user::UserRole;
use tourhub_service::notification::InAppSender;
use tourhub_service::{RetryOutcome, SenderRegistry};

use helpers::{ScriptedSender, TestApp, booking};

fn new_order(user_id: tourhub_core::types::UserId, amount: i64) -> NewOrder {
    NewOrder {
        user_id,
        total_amount: Decimal::from(amount),
        payment_status: PaymentStatus::Pending,
        status: OrderStatus::Pending,
        booking_date: None,
        check_in_date: None,
    }
}

/// In-app delivers; email always fails transiently.
fn flaky_email_app() -> (TestApp, Arc<ScriptedSender>) {
    let email = ScriptedSender::failing(NotificationChannel::Email, "smtp relay timed out");
    let mut senders = SenderRegistry::new();
    senders.register(Arc::new(InAppSender));
    senders.register(email.clone());
    (TestApp::with_senders(senders), email)
}

#[tokio::test]
async fn test_last_minute_paid_booking_is_critical() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 600);

    let mut order = new_order(ctx.user_id, 2500);
    order.payment_status = PaymentStatus::Paid;
    order.check_in_date = Some(Utc::now() + Duration::hours(12));

    let created = app.orders.create_order(&ctx, order, booking()).await.unwrap();
    assert_eq!(created.order.priority_score, 100);
    assert_eq!(created.order.priority, OrderPriority::Critical);
    assert_eq!(created.order.urgency_level, UrgencyLevel::LastMinute);
    assert!(created.order.is_priority);
    assert!(!created.order.priority_overridden);

    let records = created.dispatch.wait().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].channel, NotificationChannel::InApp);
    assert_eq!(records[0].status, NotificationStatus::Delivered);
    assert_eq!(records[0].notification_type, NotificationType::OrderConfirmed);
    assert_eq!(records[0].priority, NotificationPriority::Critical);
    assert!(records[0].sent_at.is_some());
    assert!(records[0].delivered_at.is_some());
}

#[tokio::test]
async fn test_small_undated_booking_is_low() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 0);

    let created = app
        .orders
        .create_order(&ctx, new_order(ctx.user_id, 300), booking())
        .await
        .unwrap();

    assert_eq!(created.order.priority_score, 0);
    assert_eq!(created.order.priority, OrderPriority::Low);
    assert_eq!(created.order.urgency_level, UrgencyLevel::Normal);
    assert!(!created.order.is_priority);
}

#[tokio::test]
async fn test_one_channel_failing_does_not_fail_the_order() {
    let (app, email) = flaky_email_app();
    let ctx = app.seed_user(UserRole::User, 0);
    app.mem
        .preferences
        .set_channels(
            ctx.user_id,
            NotificationType::OrderConfirmed,
            &[NotificationChannel::InApp, NotificationChannel::Email],
        )
        .await
        .unwrap();

    let created = app
        .orders
        .create_order(&ctx, new_order(ctx.user_id, 1200), booking())
        .await
        .unwrap();
    let order_id = created.order.id;
    assert!(app.mem.orders.find_by_id(order_id).await.unwrap().is_some());

    let records = created.dispatch.wait().await.unwrap();
    assert_eq!(records.len(), 2);

    let in_app = records
        .iter()
        .find(|n| n.channel == NotificationChannel::InApp)
        .unwrap();
    assert_eq!(in_app.status, NotificationStatus::Delivered);

    let failed = records
        .iter()
        .find(|n| n.channel == NotificationChannel::Email)
        .unwrap();
    assert_eq!(failed.status, NotificationStatus::Failed);
    assert!(!failed.error_message.as_deref().unwrap_or_default().is_empty());
    assert_eq!(failed.order_id, Some(order_id));

    // First attempt plus three inline retries.
    assert_eq!(failed.retry_count, app.config.notification.max_retries);
    assert_eq!(email.calls(), 4);
}

#[tokio::test]
async fn test_retry_past_the_ceiling_is_a_no_op() {
    let (app, email) = flaky_email_app();
    let ctx = app.seed_user(UserRole::User, 0);
    app.mem
        .preferences
        .set_channels(
            ctx.user_id,
            NotificationType::OrderConfirmed,
            &[NotificationChannel::Email],
        )
        .await
        .unwrap();

    let created = app
        .orders
        .create_order(&ctx, new_order(ctx.user_id, 800), booking())
        .await
        .unwrap();
    let failed = created.dispatch.wait().await.unwrap().remove(0);
    let calls_before = email.calls();

    let outcome = app.pipeline.retry.retry(failed.id).await.unwrap();
    match outcome {
        RetryOutcome::Exhausted(n) => {
            assert_eq!(n.retry_count, 3);
            assert_eq!(n.status, NotificationStatus::Failed);
        }
        other => panic!("expected exhausted, got {other:?}"),
    }
    assert_eq!(email.calls(), calls_before);
}

#[tokio::test]
async fn test_operator_retry_recovers_a_failed_record() {
    let email = ScriptedSender::failing(NotificationChannel::Email, "mailbox full");
    let mut senders = SenderRegistry::new();
    senders.register(email.clone());
    let mut config = tourhub_core::config::AppConfig::default();
    config.notification.retry_mode = tourhub_core::config::RetryMode::Deferred;
    let app = TestApp::with(config, senders);

    let ctx = app.seed_user(UserRole::User, 0);
    app.mem
        .preferences
        .set_channels(
            ctx.user_id,
            NotificationType::OrderConfirmed,
            &[NotificationChannel::Email],
        )
        .await
        .unwrap();

    let created = app
        .orders
        .create_order(&ctx, new_order(ctx.user_id, 100), booking())
        .await
        .unwrap();
    let failed = created.dispatch.wait().await.unwrap().remove(0);
    assert_eq!(failed.status, NotificationStatus::Failed);
    assert_eq!(failed.retry_count, 0);

    email.then(Ok(tourhub_service::SendReceipt::accepted()));
    let outcome = app.pipeline.retry.retry(failed.id).await.unwrap();
    let retried = outcome.into_notification();
    assert_eq!(retried.status, NotificationStatus::Sent);
    assert_eq!(retried.retry_count, 1);
    assert!(retried.error_message.is_none());
}

#[tokio::test]
async fn test_delivered_requires_sent_first() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 0);

    let pending = app
        .pipeline
        .logger
        .log(NewNotification {
            user_id: ctx.user_id,
            order_id: None,
            channel: NotificationChannel::Email,
            priority: NotificationPriority::Normal,
            title: "Booking confirmed".into(),
            content: "See you soon".into(),
            metadata: NotificationPayload::OrderConfirmed(booking()),
        })
        .await
        .unwrap();

    let err = app
        .pipeline
        .logger
        .update_status(pending.id, NotificationStatus::Delivered, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let sent = app
        .pipeline
        .logger
        .update_status(pending.id, NotificationStatus::Sent, None)
        .await
        .unwrap();
    let delivered = app
        .pipeline
        .logger
        .update_status(sent.id, NotificationStatus::Delivered, None)
        .await
        .unwrap();
    assert_eq!(delivered.sent_at, sent.sent_at);
    assert!(delivered.delivered_at.is_some());
}

#[tokio::test]
async fn test_stats_reflect_mixed_outcomes() {
    let (app, _email) = flaky_email_app();
    let ctx = app.seed_user(UserRole::User, 0);
    app.mem
        .preferences
        .set_channels(
            ctx.user_id,
            NotificationType::OrderConfirmed,
            &[NotificationChannel::InApp, NotificationChannel::Email],
        )
        .await
        .unwrap();
    let created = app
        .orders
        .create_order(&ctx, new_order(ctx.user_id, 500), booking())
        .await
        .unwrap();
    created.dispatch.wait().await.unwrap();

    let stats = app
        .pipeline
        .logger
        .stats(&NotificationFilter::for_user(ctx.user_id))
        .await
        .unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.overall.sent, 1);
    assert_eq!(stats.overall.delivered, 1);
    assert_eq!(stats.overall.failed, 1);
    assert_eq!(stats.overall.delivery_rate, 100.0);
    assert_eq!(stats.by_channel[&NotificationChannel::Email].failed, 1);
    assert_eq!(stats.by_channel[&NotificationChannel::Email].delivery_rate, 0.0);
    assert_eq!(stats.by_type[&NotificationType::OrderConfirmed].sent, 1);

    assert_eq!(stats.daily.len(), 7);
    let today = stats.daily.last().unwrap();
    assert_eq!(today.sent, 1);
    assert_eq!(today.delivered, 1);
    assert_eq!(today.failed, 1);
}

#[tokio::test]
async fn test_stats_on_empty_set_are_zero() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 0);

    let stats = app
        .pipeline
        .logger
        .stats(&NotificationFilter::for_user(ctx.user_id))
        .await
        .unwrap();

    assert_eq!(stats.total, 0);
    assert_eq!(stats.overall.delivery_rate, 0.0);
    assert!(stats.by_channel.is_empty());
    assert!(stats.daily.iter().all(|d| d.sent == 0 && d.failed == 0));
}

#[tokio::test]
async fn test_cleanup_keeps_in_flight_records() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 0);

    let created = app
        .orders
        .create_order(&ctx, new_order(ctx.user_id, 100), booking())
        .await
        .unwrap();
    let delivered = created.dispatch.wait().await.unwrap().remove(0);
    assert_eq!(delivered.status, NotificationStatus::Delivered);

    let pending = app
        .pipeline
        .logger
        .log(NewNotification {
            user_id: ctx.user_id,
            order_id: Some(created.order.id),
            channel: NotificationChannel::Sms,
            priority: NotificationPriority::Normal,
            title: "Booking confirmed".into(),
            content: "See you soon".into(),
            metadata: NotificationPayload::OrderConfirmed(booking()),
        })
        .await
        .unwrap();

    let long_ago = Utc::now() - Duration::days(45);
    for mut record in [delivered.clone(), pending.clone()] {
        record.created_at = long_ago;
        record.updated_at = long_ago;
        app.mem.notifications.put(record).await;
    }

    let deleted = app.pipeline.logger.cleanup(30).await.unwrap();
    assert_eq!(deleted, 1);

    let remaining = app.mem.notifications.all().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, pending.id);
    assert_eq!(remaining[0].status, NotificationStatus::Pending);
}

#[tokio::test]
async fn test_order_for_unknown_user_is_not_found() {
    let app = TestApp::new();
    let ctx = tourhub_service::AuthContext::new(
        tourhub_core::types::UserId::new(),
        UserRole::User,
    );

    let err = app
        .orders
        .create_order(&ctx, new_order(ctx.user_id, 100), booking())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(app.mem.orders.is_empty().await);
}
