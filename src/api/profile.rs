use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::exam::AttemptResponse;
use crate::schemas::profile::{
    LeaderboardEntry, LeaderboardResponse, PointsLogResponse, ProfileResponse,
};

const POINTS_LOG_LIMIT: i64 = 50;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(profile))
        .route("/exams", get(attempt_history))
        .route("/points", get(points_history))
        .route("/leaderboard", get(leaderboard))
}

async fn profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let rank = repositories::users::rank_for_points(state.db(), user.total_points)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute rank"))?;
    let points_log = repositories::points::list_by_user(state.db(), &user.id, POINTS_LOG_LIMIT)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load points history"))?;

    Ok(Json(ProfileResponse {
        user: user.into(),
        rank,
        points_log: points_log.into_iter().map(PointsLogResponse::from).collect(),
    }))
}

async fn attempt_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AttemptResponse>>, ApiError> {
    let attempts = repositories::attempts::list_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attempt history"))?;
    Ok(Json(attempts.into_iter().map(AttemptResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PointsHistoryQuery {
    #[serde(default = "default_points_limit")]
    limit: i64,
}

fn default_points_limit() -> i64 {
    POINTS_LOG_LIMIT
}

async fn points_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PointsHistoryQuery>,
) -> Result<Json<Vec<PointsLogResponse>>, ApiError> {
    let limit = query.limit.clamp(1, 200);
    let entries = repositories::points::list_by_user(state.db(), &user.id, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load points history"))?;
    Ok(Json(entries.into_iter().map(PointsLogResponse::from).collect()))
}

async fn leaderboard(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let size = state.settings().limits().leaderboard_size;
    let users = repositories::users::leaderboard(state.db(), size)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load leaderboard"))?;

    let entries = users
        .into_iter()
        .enumerate()
        .map(|(index, user)| LeaderboardEntry::from_user(index as i64 + 1, user))
        .collect();

    Ok(Json(LeaderboardResponse { entries }))
}
