use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{SubjectImage, SubjectPdf};

const PDF_COLUMNS: &str =
    "id, subject_id, title, file_url, file_size, downloads_count, created_at";
const IMAGE_COLUMNS: &str = "id, subject_id, title, file_url, views_count, created_at";

pub(crate) async fn list_pdfs(pool: &PgPool, subject_id: &str) -> Result<Vec<SubjectPdf>, sqlx::Error> {
    sqlx::query_as::<_, SubjectPdf>(&format!(
        "SELECT {PDF_COLUMNS} FROM subject_pdfs WHERE subject_id = $1 ORDER BY created_at ASC"
    ))
    .bind(subject_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_pdf(pool: &PgPool, id: &str) -> Result<Option<SubjectPdf>, sqlx::Error> {
    sqlx::query_as::<_, SubjectPdf>(&format!(
        "SELECT {PDF_COLUMNS} FROM subject_pdfs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreatePdf<'a> {
    pub id: &'a str,
    pub subject_id: &'a str,
    pub title: &'a str,
    pub file_url: &'a str,
    pub file_size: Option<i64>,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create_pdf(pool: &PgPool, params: CreatePdf<'_>) -> Result<SubjectPdf, sqlx::Error> {
    sqlx::query_as::<_, SubjectPdf>(&format!(
        "INSERT INTO subject_pdfs (id, subject_id, title, file_url, file_size, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {PDF_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.subject_id)
    .bind(params.title)
    .bind(params.file_url)
    .bind(params.file_size)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_pdf(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM subject_pdfs WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn increment_pdf_downloads(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE subject_pdfs SET downloads_count = downloads_count + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn list_images(
    pool: &PgPool,
    subject_id: &str,
) -> Result<Vec<SubjectImage>, sqlx::Error> {
    sqlx::query_as::<_, SubjectImage>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM subject_images WHERE subject_id = $1 ORDER BY created_at ASC"
    ))
    .bind(subject_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_image(
    pool: &PgPool,
    id: &str,
) -> Result<Option<SubjectImage>, sqlx::Error> {
    sqlx::query_as::<_, SubjectImage>(&format!(
        "SELECT {IMAGE_COLUMNS} FROM subject_images WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateImage<'a> {
    pub id: &'a str,
    pub subject_id: &'a str,
    pub title: Option<&'a str>,
    pub file_url: &'a str,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create_image(
    pool: &PgPool,
    params: CreateImage<'_>,
) -> Result<SubjectImage, sqlx::Error> {
    sqlx::query_as::<_, SubjectImage>(&format!(
        "INSERT INTO subject_images (id, subject_id, title, file_url, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {IMAGE_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.subject_id)
    .bind(params.title)
    .bind(params.file_url)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_image(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM subject_images WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn top_downloaded_pdfs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(
        "SELECT title, downloads_count FROM subject_pdfs ORDER BY downloads_count DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn increment_image_views(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE subject_images SET views_count = views_count + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
