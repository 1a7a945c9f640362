use std::collections::BTreeMap;

use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::db::models::Question;
use crate::db::types::QuestionKind;

const COLUMNS: &str = "id, exam_id, question_text, kind, options, correct_answer, question_order";

pub(crate) async fn list_by_exam(
    executor: impl PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY question_order ASC, id ASC"
    ))
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn count_by_exam(pool: &PgPool, exam_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}

pub(crate) struct CreateQuestion<'a> {
    pub id: &'a str,
    pub exam_id: &'a str,
    pub question_text: &'a str,
    pub kind: QuestionKind,
    pub options: BTreeMap<String, String>,
    pub correct_answer: &'a str,
    pub question_order: i32,
}

pub(crate) async fn create(
    executor: impl PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (id, exam_id, question_text, kind, options, correct_answer, question_order)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.question_text)
    .bind(params.kind)
    .bind(Json(params.options))
    .bind(params.correct_answer)
    .bind(params.question_order)
    .fetch_one(executor)
    .await
}

pub(crate) struct UpdateQuestion {
    pub question_text: Option<String>,
    pub kind: Option<QuestionKind>,
    pub options: Option<BTreeMap<String, String>>,
    pub correct_answer: Option<String>,
    pub question_order: Option<i32>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuestion,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE questions SET
            question_text = COALESCE($1, question_text),
            kind = COALESCE($2, kind),
            options = COALESCE($3, options),
            correct_answer = COALESCE($4, correct_answer),
            question_order = COALESCE($5, question_order)
         WHERE id = $6",
    )
    .bind(params.question_text)
    .bind(params.kind)
    .bind(params.options.map(Json))
    .bind(params.correct_answer)
    .bind(params.question_order)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn max_order(
    executor: impl PgExecutor<'_>,
    exam_id: &str,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT COALESCE(MAX(question_order), 0) FROM questions WHERE exam_id = $1",
    )
    .bind(exam_id)
    .fetch_one(executor)
    .await
}
