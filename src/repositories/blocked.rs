use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::BlockedEntry;

const COLUMNS: &str = "id, email, device_id, reason, blocked_by, blocked_at";

pub(crate) struct CreateBlockedEntry<'a> {
    pub id: &'a str,
    pub email: Option<&'a str>,
    pub device_id: Option<&'a str>,
    pub reason: Option<&'a str>,
    pub blocked_by: Option<&'a str>,
    pub blocked_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateBlockedEntry<'_>,
) -> Result<BlockedEntry, sqlx::Error> {
    sqlx::query_as::<_, BlockedEntry>(&format!(
        "INSERT INTO blocked_entries (id, email, device_id, reason, blocked_by, blocked_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.device_id)
    .bind(params.reason)
    .bind(params.blocked_by)
    .bind(params.blocked_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<BlockedEntry>, sqlx::Error> {
    sqlx::query_as::<_, BlockedEntry>(&format!(
        "SELECT {COLUMNS} FROM blocked_entries ORDER BY blocked_at DESC"
    ))
    .fetch_all(pool)
    .await
}

/// A ban matches when either the email or the device id appears in the list.
pub(crate) async fn is_banned(
    pool: &PgPool,
    email: &str,
    device_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM blocked_entries WHERE email = $1 OR device_id = $2
        )",
    )
    .bind(email)
    .bind(device_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_for_identity(
    pool: &PgPool,
    email: &str,
    device_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blocked_entries WHERE email = $1 OR device_id = $2")
        .bind(email)
        .bind(device_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM blocked_entries WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
