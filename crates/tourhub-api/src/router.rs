//! Route definitions for the TourHub HTTP API.
//!
//! All routes are mounted under `/api`.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with every route, the rate limiter, and the state.
pub fn build_router(state: AppState) -> Router {
    let limited = Router::new()
        .merge(order_routes())
        .merge(notification_routes())
        .merge(admin_routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit,
        ));

    let api_routes = Router::new().merge(limited).merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Order creation, lookup, classification, and overrides
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(handlers::order::create_order))
        .route("/orders/rescore", post(handlers::order::rescore_orders))
        .route("/orders/{id}", get(handlers::order::get_order))
        .route("/orders/{id}/classify", post(handlers::order::classify_order))
        .route(
            "/orders/{id}/priority-override",
            put(handlers::order::override_priority)
                .delete(handlers::order::clear_priority_override),
        )
}

/// Notification log, statistics, retries, and receipts
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/stats",
            get(handlers::notification::notification_stats),
        )
        .route(
            "/notifications/{id}/retry",
            post(handlers::notification::retry_notification),
        )
        .route(
            "/notifications/{id}/receipt",
            post(handlers::notification::delivery_receipt),
        )
}

fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/admin/notifications/cleanup",
        post(handlers::admin::cleanup_notifications),
    )
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
