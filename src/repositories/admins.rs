use serde_json::json;
use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Admin;

const COLUMNS: &str =
    "id, name, email, hashed_password, permissions, is_super_admin, created_at";

pub(crate) fn full_permissions() -> serde_json::Value {
    json!({
        "subjects": true,
        "exams": true,
        "students": true,
        "questions": true,
        "stats": true,
    })
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>(&format!("SELECT {COLUMNS} FROM admins WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>(&format!("SELECT {COLUMNS} FROM admins WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateAdmin<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub hashed_password: String,
    pub permissions: serde_json::Value,
    pub is_super_admin: bool,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateAdmin<'_>) -> Result<Admin, sqlx::Error> {
    sqlx::query_as::<_, Admin>(&format!(
        "INSERT INTO admins (id, name, email, hashed_password, permissions, is_super_admin, created_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(Json(params.permissions))
    .bind(params.is_super_admin)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>(&format!(
        "SELECT {COLUMNS} FROM admins ORDER BY created_at ASC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_permissions(
    pool: &PgPool,
    id: &str,
    permissions: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admins SET permissions = $1 WHERE id = $2")
        .bind(Json(permissions))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM admins WHERE id = $1 AND is_super_admin = FALSE")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
