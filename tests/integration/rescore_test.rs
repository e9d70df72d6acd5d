//! Batch re-evaluation of order priority.

mod helpers;

use rust_decimal::Decimal;

use tourhub_core::ErrorKind;
use tourhub_core::types::{OrderId, UserId};
use tourhub_database::store::{OrderStore, UserDirectory};
use tourhub_entity::order::{
    ManualPriority, NewOrder, Order, OrderPriority, OrderStatus, PaymentStatus, UrgencyLevel,
};
use tourhub_entity::user::UserRole;
use tourhub_service::{AuthContext, RescoreScope};

use helpers::{TestApp, booking};

async fn place(app: &TestApp, ctx: &AuthContext, amount: i64, status: OrderStatus) -> Order {
    let new = NewOrder {
        user_id: ctx.user_id,
        total_amount: Decimal::from(amount),
        payment_status: PaymentStatus::Pending,
        status,
        booking_date: None,
        check_in_date: None,
    };
    app.orders
        .create_order(ctx, new, booking())
        .await
        .unwrap()
        .order
}

async fn promote(app: &TestApp, user_id: UserId, role: UserRole, points: i64) {
    let mut profile = app.mem.users.get_profile(user_id).await.unwrap();
    profile.role = role;
    profile.points = points;
    app.mem.users.upsert(profile);
}

#[tokio::test]
async fn test_rescore_mine_picks_up_loyalty_changes() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 0);
    let medium = place(&app, &ctx, 1000, OrderStatus::Pending).await;
    let low = place(&app, &ctx, 100, OrderStatus::Confirmed).await;
    assert_eq!(medium.priority, OrderPriority::Medium);
    assert_eq!(low.priority_score, 10);

    promote(&app, ctx.user_id, UserRole::Vip, 750).await;

    let results = app.orders.rescore(&ctx, RescoreScope::Mine).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.changed && !r.skipped_override));

    let medium_after = app.mem.orders.get(medium.id).await.unwrap();
    assert_eq!(medium_after.priority_score, 45);
    assert_eq!(medium_after.priority, OrderPriority::High);
    assert_eq!(medium_after.urgency_level, UrgencyLevel::TimeSensitive);
    assert!(medium_after.is_consistent());

    let low_after = app.mem.orders.get(low.id).await.unwrap();
    assert_eq!(low_after.priority_score, 30);
    assert_eq!(low_after.priority, OrderPriority::Medium);
    assert!(low_after.is_priority);
}

#[tokio::test]
async fn test_rescore_twice_changes_nothing_the_second_time() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 0);
    let order = place(&app, &ctx, 2000, OrderStatus::Pending).await;
    promote(&app, ctx.user_id, UserRole::User, 500).await;

    let first = app.orders.rescore(&ctx, RescoreScope::Mine).await.unwrap();
    assert!(first[0].changed);
    let after_first = app.mem.orders.get(order.id).await.unwrap();

    let second = app.orders.rescore(&ctx, RescoreScope::Mine).await.unwrap();
    assert!(!second[0].changed);
    assert_eq!(second[0].previous, second[0].classification);

    let after_second = app.mem.orders.get(order.id).await.unwrap();
    assert_eq!(after_first.classification(), after_second.classification());
    assert_eq!(after_first.updated_at, after_second.updated_at);
}

#[tokio::test]
async fn test_rescore_all_covers_every_owner() {
    let app = TestApp::new();
    let alice = app.seed_user(UserRole::User, 0);
    let bob = app.seed_user(UserRole::User, 0);
    let admin = app.seed_user(UserRole::Admin, 0);
    place(&app, &alice, 600, OrderStatus::Pending).await;
    place(&app, &bob, 600, OrderStatus::Pending).await;

    let results = app.orders.rescore(&admin, RescoreScope::All).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| !r.changed));
}

#[tokio::test]
async fn test_explicit_ids_are_owner_checked_before_writing() {
    let app = TestApp::new();
    let alice = app.seed_user(UserRole::User, 0);
    let bob = app.seed_user(UserRole::User, 0);
    let mine = place(&app, &alice, 1000, OrderStatus::Pending).await;
    let theirs = place(&app, &bob, 1000, OrderStatus::Pending).await;
    promote(&app, alice.user_id, UserRole::Vip, 0).await;

    let err = app
        .orders
        .rescore(&alice, RescoreScope::Orders(vec![mine.id, theirs.id]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let untouched = app.mem.orders.get(mine.id).await.unwrap();
    assert_eq!(untouched.priority_score, mine.priority_score);
}

#[tokio::test]
async fn test_unknown_id_fails_the_whole_batch() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 0);
    let order = place(&app, &ctx, 1000, OrderStatus::Pending).await;
    promote(&app, ctx.user_id, UserRole::Vip, 0).await;

    let err = app
        .orders
        .rescore(&ctx, RescoreScope::Orders(vec![order.id, OrderId::new()]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(
        app.mem.orders.get(order.id).await.unwrap().priority_score,
        25
    );
}

#[tokio::test]
async fn test_overridden_orders_are_skipped_until_cleared() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 0);
    let admin = app.seed_user(UserRole::Admin, 0);
    let order = place(&app, &ctx, 100, OrderStatus::Pending).await;

    let manual = ManualPriority {
        priority: OrderPriority::Critical,
        urgency_level: UrgencyLevel::Vip,
        is_priority: true,
    };
    let overridden = app
        .orders
        .override_priority(&admin, order.id, manual)
        .await
        .unwrap();
    assert!(overridden.priority_overridden);
    assert_eq!(overridden.priority, OrderPriority::Critical);
    assert_eq!(overridden.priority_score, 0);

    promote(&app, ctx.user_id, UserRole::Vip, 600).await;
    let results = app
        .orders
        .rescore(&ctx, RescoreScope::Orders(vec![order.id]))
        .await
        .unwrap();
    assert!(results[0].skipped_override);
    assert!(!results[0].changed);

    let err = app.orders.reclassify(&ctx, order.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let cleared = app.orders.clear_override(&admin, order.id).await.unwrap();
    assert!(!cleared.priority_overridden);
    assert_eq!(cleared.priority_score, 20);
    assert_eq!(cleared.priority, OrderPriority::Low);
    assert!(cleared.is_consistent());
}
