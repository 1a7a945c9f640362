use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Exam;
use crate::db::types::LifecycleStatus;

const COLUMNS: &str =
    "id, subject_id, level, name, status, open_at, close_at, pass_percentage, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_subject(pool: &PgPool, subject_id: &str) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE subject_id = $1 ORDER BY level ASC"
    ))
    .bind(subject_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_subject_and_level(
    pool: &PgPool,
    subject_id: &str,
    level: i32,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE subject_id = $1 AND level = $2"
    ))
    .bind(subject_id)
    .bind(level)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateExam<'a> {
    pub id: &'a str,
    pub subject_id: &'a str,
    pub level: i32,
    pub name: &'a str,
    pub status: LifecycleStatus,
    pub open_at: Option<PrimitiveDateTime>,
    pub close_at: Option<PrimitiveDateTime>,
    pub pass_percentage: i32,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (id, subject_id, level, name, status, open_at, close_at, pass_percentage, created_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.subject_id)
    .bind(params.level)
    .bind(params.name)
    .bind(params.status)
    .bind(params.open_at)
    .bind(params.close_at)
    .bind(params.pass_percentage)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateExam {
    pub name: Option<String>,
    pub status: Option<LifecycleStatus>,
    pub open_at: Option<PrimitiveDateTime>,
    pub close_at: Option<PrimitiveDateTime>,
    pub pass_percentage: Option<i32>,
}

pub(crate) async fn update(pool: &PgPool, id: &str, params: UpdateExam) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE exams SET
            name = COALESCE($1, name),
            status = COALESCE($2, status),
            open_at = COALESCE($3, open_at),
            close_at = COALESCE($4, close_at),
            pass_percentage = COALESCE($5, pass_percentage)
         WHERE id = $6",
    )
    .bind(params.name)
    .bind(params.status)
    .bind(params.open_at)
    .bind(params.close_at)
    .bind(params.pass_percentage)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exams").fetch_one(pool).await
}
