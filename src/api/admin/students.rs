use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentAdmin};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::User;
use crate::repositories;
use crate::schemas::admin::{BlockStudentRequest, BlockedEntryResponse, StudentAdminResponse};

#[derive(Debug, Deserialize)]
pub(crate) struct StudentListQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    100
}

pub(crate) async fn list(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<Vec<StudentAdminResponse>>, ApiError> {
    require_permission(&admin, "students")?;

    let limit = query.limit.clamp(1, 500);
    let users =
        repositories::users::search(state.db(), query.q.as_deref(), limit, query.offset.max(0))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list students"))?;
    Ok(Json(users.into_iter().map(StudentAdminResponse::from).collect()))
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn students_csv(users: &[User]) -> String {
    let mut out = String::from("name,email,device_id,total_points,is_blocked,registered_at\n");
    for user in users {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_escape(&user.name),
            csv_escape(&user.email),
            csv_escape(&user.device_id),
            user.total_points,
            user.is_blocked,
            format_primitive(user.registered_at),
        ));
    }
    out
}

pub(crate) async fn export_csv(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
) -> Result<impl IntoResponse, ApiError> {
    require_permission(&admin, "students")?;

    let users = repositories::users::search(state.db(), None, i64::MAX, 0)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to export students"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"students.csv\""),
        ],
        students_csv(&users),
    ))
}

/// Blocking a student also bans the (email, device) identity so a
/// fresh login cannot recreate the account.
pub(crate) async fn block(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(student_id): Path<String>,
    Json(payload): Json<BlockStudentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "students")?;

    let user = repositories::users::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    repositories::users::set_blocked(state.db(), &user.id, true, payload.reason.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to block student"))?;

    repositories::blocked::create(
        state.db(),
        repositories::blocked::CreateBlockedEntry {
            id: &Uuid::new_v4().to_string(),
            email: Some(&user.email),
            device_id: Some(&user.device_id),
            reason: payload.reason.as_deref(),
            blocked_by: Some(&admin.id),
            blocked_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record ban"))?;

    Ok(Json(serde_json::json!({"ok": true})))
}

pub(crate) async fn unblock(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(student_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "students")?;

    let user = repositories::users::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    repositories::users::set_blocked(state.db(), &user.id, false, None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to unblock student"))?;
    repositories::blocked::delete_for_identity(state.db(), &user.email, &user.device_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to clear ban entries"))?;

    Ok(Json(serde_json::json!({"ok": true})))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(student_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "students")?;

    let deleted = repositories::users::delete(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete student"))?;
    if !deleted {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

pub(crate) async fn blocked_list(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
) -> Result<Json<Vec<BlockedEntryResponse>>, ApiError> {
    require_permission(&admin, "students")?;
    let entries = repositories::blocked::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list blocked entries"))?;
    Ok(Json(entries.into_iter().map(BlockedEntryResponse::from).collect()))
}

pub(crate) async fn unban(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(entry_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "students")?;

    let deleted = repositories::blocked::delete(state.db(), &entry_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete blocked entry"))?;
    if !deleted {
        return Err(ApiError::NotFound("Blocked entry not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

#[cfg(test)]
mod tests {
    use super::csv_escape;

    #[test]
    fn csv_escaping_quotes_only_when_needed() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("has,comma"), "\"has,comma\"");
        assert_eq!(csv_escape("has \"quote\""), "\"has \"\"quote\"\"\"");
    }
}
