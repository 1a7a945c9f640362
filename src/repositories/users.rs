use sqlx::{PgExecutor, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::User;

const COLUMNS: &str = "\
    id, name, email, device_id, total_points, is_blocked, blocked_reason, \
    registered_at, last_login";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email_and_device(
    pool: &PgPool,
    email: &str,
    device_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE email = $1 AND device_id = $2"
    ))
    .bind(email)
    .bind(device_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub device_id: &'a str,
    pub registered_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (id, name, email, device_id, registered_at, last_login)
         VALUES ($1,$2,$3,$4,$5,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.email)
    .bind(params.device_id)
    .bind(params.registered_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn touch_last_login(
    pool: &PgPool,
    id: &str,
    at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn set_blocked(
    pool: &PgPool,
    id: &str,
    blocked: bool,
    reason: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_blocked = $1, blocked_reason = $2 WHERE id = $3")
        .bind(blocked)
        .bind(reason)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns the new total after the increment.
pub(crate) async fn add_points(
    executor: impl PgExecutor<'_>,
    id: &str,
    delta: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "UPDATE users SET total_points = total_points + $1 WHERE id = $2 RETURNING total_points",
    )
    .bind(delta)
    .bind(id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn leaderboard(pool: &PgPool, limit: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users
         WHERE is_blocked = FALSE
         ORDER BY total_points DESC, registered_at ASC
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// 1-based position among non-blocked users, higher totals first.
pub(crate) async fn rank_for_points(pool: &PgPool, total_points: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) + 1 FROM users WHERE is_blocked = FALSE AND total_points > $1",
    )
    .bind(total_points)
    .fetch_one(pool)
    .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users").fetch_one(pool).await
}

/// Admin listing: points-ordered, with optional name/email search.
pub(crate) async fn search(
    pool: &PgPool,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users
         WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
         ORDER BY total_points DESC, registered_at ASC
         LIMIT $2 OFFSET $3"
    ))
    .bind(query)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}
