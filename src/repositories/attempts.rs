use std::collections::BTreeMap;

use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::ExamAttempt;

const COLUMNS: &str = "id, user_id, exam_id, score, passed, answers, attempted_at";

pub(crate) struct CreateAttempt<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub exam_id: &'a str,
    pub score: f64,
    pub passed: bool,
    pub answers: BTreeMap<String, String>,
    pub attempted_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl PgExecutor<'_>,
    params: CreateAttempt<'_>,
) -> Result<ExamAttempt, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!(
        "INSERT INTO exam_attempts (id, user_id, exam_id, score, passed, answers, attempted_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.exam_id)
    .bind(params.score)
    .bind(params.passed)
    .bind(Json(params.answers))
    .bind(params.attempted_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_user_and_exam(
    pool: &PgPool,
    user_id: &str,
    exam_id: &str,
) -> Result<Vec<ExamAttempt>, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!(
        "SELECT {COLUMNS} FROM exam_attempts
         WHERE user_id = $1 AND exam_id = $2
         ORDER BY attempted_at DESC"
    ))
    .bind(user_id)
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<ExamAttempt>, sqlx::Error> {
    sqlx::query_as::<_, ExamAttempt>(&format!(
        "SELECT {COLUMNS} FROM exam_attempts WHERE user_id = $1 ORDER BY attempted_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn best_score(
    pool: &PgPool,
    user_id: &str,
    exam_id: &str,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<f64>>(
        "SELECT MAX(score) FROM exam_attempts WHERE user_id = $1 AND exam_id = $2",
    )
    .bind(user_id)
    .bind(exam_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn has_passed(
    pool: &PgPool,
    user_id: &str,
    exam_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM exam_attempts WHERE user_id = $1 AND exam_id = $2 AND passed = TRUE
        )",
    )
    .bind(user_id)
    .bind(exam_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exam_attempts").fetch_one(pool).await
}

/// Attempts made on the UTC calendar day containing `at`.
pub(crate) async fn count_on_day(
    pool: &PgPool,
    at: PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM exam_attempts
         WHERE date_trunc('day', attempted_at) = date_trunc('day', $1::timestamp)",
    )
    .bind(at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn average_score(pool: &PgPool) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<f64>>("SELECT AVG(score) FROM exam_attempts")
        .fetch_one(pool)
        .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamStats {
    pub(crate) attempts: i64,
    pub(crate) average_score: Option<f64>,
    pub(crate) best_score: Option<f64>,
    pub(crate) worst_score: Option<f64>,
    pub(crate) passed_count: i64,
}

pub(crate) async fn stats_for_exam(pool: &PgPool, exam_id: &str) -> Result<ExamStats, sqlx::Error> {
    sqlx::query_as::<_, ExamStats>(
        "SELECT COUNT(*) AS attempts,
                AVG(score) AS average_score,
                MAX(score) AS best_score,
                MIN(score) AS worst_score,
                COUNT(*) FILTER (WHERE passed) AS passed_count
         FROM exam_attempts WHERE exam_id = $1",
    )
    .bind(exam_id)
    .fetch_one(pool)
    .await
}
