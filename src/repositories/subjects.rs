use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Subject;
use crate::db::types::LifecycleStatus;

const COLUMNS: &str =
    "id, term_id, name, description, cover_image, status, scheduled_at, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_term(pool: &PgPool, term_id: &str) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "SELECT {COLUMNS} FROM subjects WHERE term_id = $1 ORDER BY created_at ASC"
    ))
    .bind(term_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "SELECT {COLUMNS} FROM subjects ORDER BY created_at ASC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateSubject<'a> {
    pub id: &'a str,
    pub term_id: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub cover_image: Option<&'a str>,
    pub status: LifecycleStatus,
    pub scheduled_at: Option<PrimitiveDateTime>,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSubject<'_>,
) -> Result<Subject, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (id, term_id, name, description, cover_image, status, scheduled_at, created_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.term_id)
    .bind(params.name)
    .bind(params.description)
    .bind(params.cover_image)
    .bind(params.status)
    .bind(params.scheduled_at)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateSubject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub status: Option<LifecycleStatus>,
    pub scheduled_at: Option<PrimitiveDateTime>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateSubject,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE subjects SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            cover_image = COALESCE($3, cover_image),
            status = COALESCE($4, status),
            scheduled_at = COALESCE($5, scheduled_at)
         WHERE id = $6",
    )
    .bind(params.name)
    .bind(params.description)
    .bind(params.cover_image)
    .bind(params.status)
    .bind(params.scheduled_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subjects").fetch_one(pool).await
}
