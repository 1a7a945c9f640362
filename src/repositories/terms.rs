use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Term;

const COLUMNS: &str = "id, name, created_at";

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Term>, sqlx::Error> {
    sqlx::query_as::<_, Term>(&format!("SELECT {COLUMNS} FROM terms ORDER BY created_at ASC"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Term>, sqlx::Error> {
    sqlx::query_as::<_, Term>(&format!("SELECT {COLUMNS} FROM terms WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_name(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM terms WHERE name = $1)")
        .bind(name)
        .fetch_one(pool)
        .await
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    name: &str,
    created_at: PrimitiveDateTime,
) -> Result<Term, sqlx::Error> {
    sqlx::query_as::<_, Term>(&format!(
        "INSERT INTO terms (id, name, created_at) VALUES ($1,$2,$3) RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn rename(pool: &PgPool, id: &str, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE terms SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM terms WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
