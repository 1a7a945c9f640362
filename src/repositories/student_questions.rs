use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::StudentQuestion;

const COLUMNS: &str =
    "id, user_id, question_text, admin_reply, replied_by, replied_at, is_replied, created_at";

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    question_text: &str,
    created_at: PrimitiveDateTime,
) -> Result<StudentQuestion, sqlx::Error> {
    sqlx::query_as::<_, StudentQuestion>(&format!(
        "INSERT INTO student_questions (id, user_id, question_text, created_at)
         VALUES ($1,$2,$3,$4)
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(user_id)
    .bind(question_text)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<StudentQuestion>, sqlx::Error> {
    sqlx::query_as::<_, StudentQuestion>(&format!(
        "SELECT {COLUMNS} FROM student_questions WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all(
    pool: &PgPool,
    only_unreplied: bool,
) -> Result<Vec<StudentQuestion>, sqlx::Error> {
    sqlx::query_as::<_, StudentQuestion>(&format!(
        "SELECT {COLUMNS} FROM student_questions
         WHERE ($1 = FALSE OR is_replied = FALSE)
         ORDER BY created_at DESC"
    ))
    .bind(only_unreplied)
    .fetch_all(pool)
    .await
}

/// Submissions made during the calendar month containing `at`, UTC.
pub(crate) async fn count_in_month(
    pool: &PgPool,
    user_id: &str,
    at: PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM student_questions
         WHERE user_id = $1
           AND date_trunc('month', created_at) = date_trunc('month', $2::timestamp)",
    )
    .bind(user_id)
    .bind(at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn count_unreplied(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM student_questions WHERE is_replied = FALSE",
    )
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM student_questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn reply(
    pool: &PgPool,
    id: &str,
    admin_id: &str,
    reply_text: &str,
    replied_at: PrimitiveDateTime,
) -> Result<Option<StudentQuestion>, sqlx::Error> {
    sqlx::query_as::<_, StudentQuestion>(&format!(
        "UPDATE student_questions
         SET admin_reply = $1, replied_by = $2, replied_at = $3, is_replied = TRUE
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(reply_text)
    .bind(admin_id)
    .bind(replied_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}
