//! Order handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use validator::Validate;

use tourhub_core::AppError;
use tourhub_core::types::OrderId;
use tourhub_entity::order::{Classification, ManualPriority, Order};
use tourhub_service::{RescoreResult, RescoreScope};

use crate::dto::request::CreateOrderRequest;
use crate::dto::response::{ApiResponse, CreateOrderResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateOrderResponse>>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid order request: {e}")))?;
    let (new, details) = req.into_parts(auth.user_id);

    let created = state.orders.create_order(&auth, new, details).await?;
    let response = CreateOrderResponse {
        dispatch_task_id: created.dispatch.task_id(),
        order: created.order,
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response))))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<OrderId>,
) -> Result<Json<ApiResponse<Order>>, ApiError> {
    let order = state.orders.get_order(&auth, id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// POST /api/orders/{id}/classify
pub async fn classify_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<OrderId>,
) -> Result<Json<ApiResponse<Classification>>, ApiError> {
    let classification = state.orders.reclassify(&auth, id).await?;
    Ok(Json(ApiResponse::ok(classification)))
}

/// POST /api/orders/rescore
pub async fn rescore_orders(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(scope): Json<RescoreScope>,
) -> Result<Json<ApiResponse<Vec<RescoreResult>>>, ApiError> {
    if scope == RescoreScope::All {
        auth.require_admin()?;
    }
    let results = state.orders.rescore(&auth, scope).await?;
    Ok(Json(ApiResponse::ok(results)))
}

/// PUT /api/orders/{id}/priority-override
pub async fn override_priority(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<OrderId>,
    Json(manual): Json<ManualPriority>,
) -> Result<Json<ApiResponse<Order>>, ApiError> {
    let order = state.orders.override_priority(&auth, id, manual).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// DELETE /api/orders/{id}/priority-override
pub async fn clear_priority_override(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<OrderId>,
) -> Result<Json<ApiResponse<Order>>, ApiError> {
    let order = state.orders.clear_override(&auth, id).await?;
    Ok(Json(ApiResponse::ok(order)))
}
