use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::notification::{NotificationListResponse, NotificationResponse};

const NOTIFICATION_LIMIT: i64 = 50;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/read-all", post(mark_all_read))
        .route("/:notification_id/read", post(mark_read))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let notifications =
        repositories::notifications::list_by_user(state.db(), &user.id, NOTIFICATION_LIMIT)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list notifications"))?;
    let unread_count = repositories::notifications::unread_count(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count unread notifications"))?;

    Ok(Json(NotificationListResponse {
        notifications: notifications.into_iter().map(NotificationResponse::from).collect(),
        unread_count,
    }))
}

async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = repositories::notifications::mark_read(state.db(), &user.id, &notification_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to mark notification read"))?;

    if !updated {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = repositories::notifications::mark_all_read(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to mark notifications read"))?;
    Ok(Json(serde_json::json!({"updated": updated})))
}
