use sqlx::{PgExecutor, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Notification;
use crate::db::types::NotificationKind;

const COLUMNS: &str = "id, user_id, message, kind, link, is_read, created_at";

pub(crate) struct CreateNotification<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub message: &'a str,
    pub kind: NotificationKind,
    pub link: Option<&'a str>,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl PgExecutor<'_>,
    params: CreateNotification<'_>,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (id, user_id, message, kind, link, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.message)
    .bind(params.kind)
    .bind(params.link)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Fans one message out to every non-blocked user. Ids are derived
/// server-side so a single statement covers the whole audience.
pub(crate) async fn create_for_all_users(
    pool: &PgPool,
    message: &str,
    kind: NotificationKind,
    link: Option<&str>,
    created_at: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO notifications (id, user_id, message, kind, link, created_at)
         SELECT gen_random_uuid()::text, id, $1, $2, $3, $4
         FROM users WHERE is_blocked = FALSE",
    )
    .bind(message)
    .bind(kind)
    .bind(link)
    .bind(created_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn list_by_user(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn unread_count(pool: &PgPool, user_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn mark_read(pool: &PgPool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn mark_all_read(pool: &PgPool, user_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
