use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::PointsLogEntry;
use crate::db::types::PointsAction;

const COLUMNS: &str = "id, user_id, action, points, detail, created_at";

pub(crate) struct CreatePointsEntry<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub action: PointsAction,
    pub points: i64,
    pub detail: serde_json::Value,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn append(
    executor: impl PgExecutor<'_>,
    params: CreatePointsEntry<'_>,
) -> Result<PointsLogEntry, sqlx::Error> {
    sqlx::query_as::<_, PointsLogEntry>(&format!(
        "INSERT INTO points_log (id, user_id, action, points, detail, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.action)
    .bind(params.points)
    .bind(Json(params.detail))
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_user(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<PointsLogEntry>, sqlx::Error> {
    sqlx::query_as::<_, PointsLogEntry>(&format!(
        "SELECT {COLUMNS} FROM points_log WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn sum_for_user(pool: &PgPool, user_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(points), 0)::BIGINT FROM points_log WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}
