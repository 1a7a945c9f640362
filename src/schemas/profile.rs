use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::{PointsLogEntry, User};
use crate::db::types::PointsAction;
use crate::schemas::auth::UserResponse;

#[derive(Debug, Serialize)]
pub(crate) struct PointsLogResponse {
    pub(crate) id: String,
    pub(crate) action: PointsAction,
    pub(crate) points: i64,
    pub(crate) detail: serde_json::Value,
    pub(crate) created_at: String,
}

impl From<PointsLogEntry> for PointsLogResponse {
    fn from(entry: PointsLogEntry) -> Self {
        Self {
            id: entry.id,
            action: entry.action,
            points: entry.points,
            detail: entry.detail.0,
            created_at: format_primitive(entry.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileResponse {
    pub(crate) user: UserResponse,
    pub(crate) rank: i64,
    pub(crate) points_log: Vec<PointsLogResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LeaderboardEntry {
    pub(crate) rank: i64,
    pub(crate) name: String,
    pub(crate) total_points: i64,
}

impl LeaderboardEntry {
    pub(crate) fn from_user(rank: i64, user: User) -> Self {
        Self { rank, name: user.name, total_points: user.total_points }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LeaderboardResponse {
    pub(crate) entries: Vec<LeaderboardEntry>,
}
