use sqlx::{PgExecutor, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Rating;

const COLUMNS: &str = "id, user_id, subject_id, rating, created_at";

pub(crate) async fn find_by_user_and_subject(
    pool: &PgPool,
    user_id: &str,
    subject_id: &str,
) -> Result<Option<Rating>, sqlx::Error> {
    sqlx::query_as::<_, Rating>(&format!(
        "SELECT {COLUMNS} FROM ratings WHERE user_id = $1 AND subject_id = $2"
    ))
    .bind(user_id)
    .bind(subject_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateRating<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub subject_id: &'a str,
    pub rating: i32,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl PgExecutor<'_>,
    params: CreateRating<'_>,
) -> Result<Rating, sqlx::Error> {
    sqlx::query_as::<_, Rating>(&format!(
        "INSERT INTO ratings (id, user_id, subject_id, rating, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.subject_id)
    .bind(params.rating)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update_value(
    pool: &PgPool,
    id: &str,
    rating: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE ratings SET rating = $1 WHERE id = $2")
        .bind(rating)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn average_for_subject(
    pool: &PgPool,
    subject_id: &str,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<f64>>(
        "SELECT AVG(rating::float8) FROM ratings WHERE subject_id = $1",
    )
    .bind(subject_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn count_for_subject(pool: &PgPool, subject_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ratings WHERE subject_id = $1")
        .bind(subject_id)
        .fetch_one(pool)
        .await
}
