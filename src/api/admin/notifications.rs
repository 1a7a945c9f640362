use axum::extract::State;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentAdmin};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::schemas::admin::{BroadcastRequest, BroadcastResponse};
use crate::services::notifications;

pub(crate) async fn broadcast(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, ApiError> {
    require_permission(&admin, "stats")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let delivered = notifications::broadcast(
        state.db(),
        payload.message.trim(),
        payload.kind,
        payload.link.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to broadcast notification"))?;

    Ok(Json(BroadcastResponse { delivered }))
}
