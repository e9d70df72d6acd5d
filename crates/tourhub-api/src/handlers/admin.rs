//! Admin maintenance handlers.

use axum::Json;
use axum::extract::{Query, State};

use crate::dto::request::CleanupQuery;
use crate::dto::response::{ApiResponse, CleanupResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/admin/notifications/cleanup
pub async fn cleanup_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<ApiResponse<CleanupResponse>>, ApiError> {
    auth.require_admin()?;
    let retention_days = query
        .retention_days
        .unwrap_or(state.config.notification.retention_days);
    let deleted = state.notifications.logger.cleanup(retention_days).await?;
    Ok(Json(ApiResponse::ok(CleanupResponse {
        deleted,
        retention_days,
    })))
}
