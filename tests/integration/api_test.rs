//! HTTP surface: routing, caller identity, error mapping, rate limiting.

mod helpers;

use axum::http::{Method, StatusCode};
use serde_json::json;

use tourhub_core::config::AppConfig;
use tourhub_database::store::ChannelPreferences;
use tourhub_entity::notification::{NotificationChannel, NotificationType};
use tourhub_entity::user::UserRole;
use tourhub_service::SenderRegistry;

use helpers::{TestApp, booking_json};

fn critical_order() -> serde_json::Value {
    let check_in = chrono::Utc::now() + chrono::Duration::hours(6);
    json!({
        "total_amount": "2500",
        "payment_status": "PAID",
        "check_in_date": check_in,
        "booking": booking_json()
    })
}

#[tokio::test]
async fn test_health_needs_no_identity() {
    let app = TestApp::new();

    let res = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["status"], "ok");
    assert_eq!(res.data()["store"], "memory");
}

#[tokio::test]
async fn test_create_order_returns_classification_and_task() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 600);

    let res = app.post("/api/orders", critical_order(), &ctx).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let order = &res.data()["order"];
    assert_eq!(order["priority"], "CRITICAL");
    assert_eq!(order["urgency_level"], "LAST_MINUTE");
    assert_eq!(order["priority_score"], 100);
    assert_eq!(order["is_priority"], true);
    assert!(res.data()["dispatch_task_id"].is_string());

    let id = order["id"].as_str().unwrap();
    let fetched = app.get(&format!("/api/orders/{id}"), &ctx).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.data()["priority_score"], 100);

    let list = app.get("/api/notifications", &ctx).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.data()["total_items"], 1);
    let item = &list.data()["items"][0];
    assert_eq!(item["status"], "DELIVERED");
    assert_eq!(item["channel"], "IN_APP");
    assert_eq!(item["order_id"], order["id"]);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = TestApp::new();

    let res = app
        .request(Method::POST, "/api/orders", Some(critical_order()), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_role_header_is_unauthorized() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 0);

    let req = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/api/notifications")
        .header("x-user-id", ctx.user_id.to_string())
        .header("x-user-role", "superuser")
        .body(axum::body::Body::empty())
        .unwrap();
    let res = tower::ServiceExt::oneshot(app.router.clone(), req)
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_negative_amount_is_rejected() {
    let app = TestApp::new();
    let ctx = app.seed_user(UserRole::User, 0);

    let mut body = critical_order();
    body["total_amount"] = json!("-5");
    let res = app.post("/api/orders", body, &ctx).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "VALIDATION_ERROR");
    assert!(app.mem.orders.is_empty().await);
}

#[tokio::test]
async fn test_other_users_order_is_forbidden() {
    let app = TestApp::new();
    let owner = app.seed_user(UserRole::User, 0);
    let stranger = app.seed_user(UserRole::User, 0);

    let created = app.post("/api/orders", critical_order(), &owner).await;
    let id = created.data()["order"]["id"].as_str().unwrap().to_string();

    let res = app.get(&format!("/api/orders/{id}"), &stranger).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .get(&format!("/api/orders/{}", tourhub_core::types::OrderId::new()), &owner)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rescore_all_is_admin_only() {
    let app = TestApp::new();
    let user = app.seed_user(UserRole::User, 0);
    let admin = app.seed_user(UserRole::Admin, 0);
    app.post("/api/orders", critical_order(), &user).await;

    let res = app.post("/api/orders/rescore", json!({"scope": "all"}), &user).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.post("/api/orders/rescore", json!({"scope": "all"}), &admin).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data().as_array().unwrap().len(), 1);

    let res = app.post("/api/orders/rescore", json!({"scope": "mine"}), &user).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()[0]["changed"], false);
}

#[tokio::test]
async fn test_override_then_classify_conflicts() {
    let app = TestApp::new();
    let user = app.seed_user(UserRole::User, 0);
    let admin = app.seed_user(UserRole::Admin, 0);
    let created = app.post("/api/orders", critical_order(), &user).await;
    let id = created.data()["order"]["id"].as_str().unwrap().to_string();
    let path = format!("/api/orders/{id}/priority-override");
    let manual = json!({"priority": "LOW", "urgency_level": "NORMAL", "is_priority": false});

    let res = app
        .request(Method::PUT, &path, Some(manual.clone()), Some(&user))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.request(Method::PUT, &path, Some(manual), Some(&admin)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["priority"], "LOW");
    assert_eq!(res.data()["priority_overridden"], true);
    assert_eq!(res.data()["priority_score"], 90);

    let res = app
        .post(&format!("/api/orders/{id}/classify"), json!({}), &user)
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.request(Method::DELETE, &path, None, Some(&admin)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["priority"], "CRITICAL");
    assert_eq!(res.data()["priority_overridden"], false);
}

#[tokio::test]
async fn test_delivery_receipts() {
    let app = TestApp::new();
    let user = app.seed_user(UserRole::User, 0);
    let admin = app.seed_user(UserRole::Admin, 0);
    app.mem
        .preferences
        .set_channels(
            user.user_id,
            NotificationType::OrderConfirmed,
            &[NotificationChannel::Email, NotificationChannel::Sms],
        )
        .await
        .unwrap();
    app.post("/api/orders", critical_order(), &user).await;

    let list = app.get("/api/notifications?channel=EMAIL", &user).await;
    assert_eq!(list.data()["total_items"], 1);
    let email = list.data()["items"][0].clone();
    assert_eq!(email["status"], "SENT");
    let email_id = email["id"].as_str().unwrap();

    let receipt = format!("/api/notifications/{email_id}/receipt");
    let res = app.post(&receipt, json!({"status": "DELIVERED"}), &user).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.post(&receipt, json!({"status": "DELIVERED"}), &admin).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["status"], "DELIVERED");
    assert!(res.data()["delivered_at"].is_string());

    let sms = app.get("/api/notifications?channel=SMS", &user).await;
    let sms_id = sms.data()["items"][0]["id"].as_str().unwrap().to_string();
    let receipt = format!("/api/notifications/{sms_id}/receipt");

    let res = app.post(&receipt, json!({"status": "FAILED"}), &admin).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.post(&receipt, json!({"status": "SENT"}), &admin).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            &receipt,
            json!({"status": "FAILED", "error_message": "handset unreachable"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["status"], "FAILED");
    assert_eq!(res.data()["retryable"], false);

    let res = app
        .post(&format!("/api/notifications/{sms_id}/retry"), json!({}), &admin)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["outcome"], "sent");
    assert_eq!(res.data()["notification"]["retry_count"], 1);

    let res = app
        .post(&format!("/api/notifications/{email_id}/retry"), json!({}), &admin)
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_listing_is_scoped_to_the_caller() {
    let app = TestApp::new();
    let alice = app.seed_user(UserRole::User, 0);
    let bob = app.seed_user(UserRole::User, 0);
    let admin = app.seed_user(UserRole::Admin, 0);
    app.post("/api/orders", critical_order(), &alice).await;
    app.post("/api/orders", critical_order(), &bob).await;

    let res = app
        .get(&format!("/api/notifications?user_id={}", alice.user_id), &bob)
        .await;
    assert_eq!(res.data()["total_items"], 1);
    assert_eq!(res.data()["items"][0]["user_id"], bob.user_id.to_string());

    let res = app.get("/api/notifications", &admin).await;
    assert_eq!(res.data()["total_items"], 2);

    let res = app.get("/api/notifications/stats", &admin).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["total"], 2);
    assert_eq!(res.data()["overall"]["delivery_rate"], 100.0);
    assert_eq!(res.data()["daily"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_cleanup_endpoint() {
    let app = TestApp::new();
    let user = app.seed_user(UserRole::User, 0);
    let admin = app.seed_user(UserRole::Admin, 0);

    let res = app
        .post("/api/admin/notifications/cleanup", json!({}), &user)
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .post("/api/admin/notifications/cleanup?retention_days=0", json!({}), &admin)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post("/api/admin/notifications/cleanup", json!({}), &admin)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["deleted"], 0);
    assert_eq!(
        res.data()["retention_days"],
        app.config.notification.retention_days
    );
}

#[tokio::test]
async fn test_rate_limit_applies_per_caller() {
    let mut config = AppConfig::default();
    config.rate_limit.max_tokens = 2;
    config.rate_limit.refill_per_second = 0.0;
    let app = TestApp::with(config, SenderRegistry::with_defaults());
    let alice = app.seed_user(UserRole::User, 0);
    let bob = app.seed_user(UserRole::User, 0);

    assert_eq!(app.get("/api/notifications", &alice).await.status, StatusCode::OK);
    assert_eq!(app.get("/api/notifications", &alice).await.status, StatusCode::OK);
    let limited = app.get("/api/notifications", &alice).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "RATE_LIMITED");

    assert_eq!(app.get("/api/notifications", &bob).await.status, StatusCode::OK);
    let health = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
}

#[tokio::test]
async fn test_rotating_junk_ids_share_one_bucket() {
    let mut config = AppConfig::default();
    config.rate_limit.max_tokens = 2;
    config.rate_limit.refill_per_second = 0.0;
    let app = TestApp::with(config, SenderRegistry::with_defaults());
    let alice = app.seed_user(UserRole::User, 0);

    let mut statuses = Vec::new();
    for junk in ["caller-1", "caller-2", "caller-3"] {
        let req = axum::http::Request::builder()
            .method(Method::GET)
            .uri("/api/notifications")
            .header("x-user-id", junk)
            .header("x-user-role", "USER")
            .body(axum::body::Body::empty())
            .unwrap();
        let res = tower::ServiceExt::oneshot(app.router.clone(), req)
            .await
            .unwrap();
        statuses.push(res.status());
    }
    assert_eq!(
        statuses,
        vec![
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );

    assert_eq!(app.get("/api/notifications", &alice).await.status, StatusCode::OK);
}
