//! Notification handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use tourhub_core::AppError;
use tourhub_core::types::{NotificationId, PageResponse};
use tourhub_entity::notification::{Notification, NotificationStats, NotificationStatus};
use tourhub_service::RetryOutcome;

use crate::dto::request::{DeliveryReceiptRequest, NotificationQuery};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<PageResponse<Notification>>>, ApiError> {
    let filter = auth.scope_filter(query.filter());
    let page = state
        .notifications
        .logger
        .query(&filter, &query.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/notifications/stats
pub async fn notification_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<NotificationStats>>, ApiError> {
    let filter = auth.scope_filter(query.filter());
    let stats = state.notifications.logger.stats(&filter).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// POST /api/notifications/{id}/retry
///
/// Operator retry. Ignores the automatic-retry eligibility flag but not the
/// retry ceiling.
pub async fn retry_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<ApiResponse<RetryOutcome>>, ApiError> {
    auth.require_admin()?;
    let outcome = state.notifications.retry.retry(id).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /api/notifications/{id}/receipt
///
/// Channel webhook callback. Bounces are not retried automatically.
pub async fn delivery_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
    Json(req): Json<DeliveryReceiptRequest>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    auth.require_admin()?;
    let logger = &state.notifications.logger;
    let updated = match req.status {
        NotificationStatus::Delivered => {
            logger
                .update_status(id, NotificationStatus::Delivered, None)
                .await?
        }
        NotificationStatus::Failed => {
            logger
                .record_failure(id, req.error_message.unwrap_or_default(), false)
                .await?
        }
        other => {
            return Err(AppError::validation(format!(
                "A delivery receipt can only report DELIVERED or FAILED, got {other}"
            ))
            .into());
        }
    };
    Ok(Json(ApiResponse::ok(updated)))
}
