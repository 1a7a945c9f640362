use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_super_admin, CurrentAdmin};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::admin::{AdminCreate, PermissionsUpdate};
use crate::schemas::auth::AdminResponse;

pub(crate) async fn list(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
) -> Result<Json<Vec<AdminResponse>>, ApiError> {
    require_super_admin(&admin)?;
    let admins = repositories::admins::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list admins"))?;
    Ok(Json(admins.into_iter().map(AdminResponse::from).collect()))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<AdminCreate>,
) -> Result<Json<AdminResponse>, ApiError> {
    require_super_admin(&admin)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let email = payload.email.trim().to_lowercase();
    let existing = repositories::admins::find_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up admin"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("An admin with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let permissions =
        payload.permissions.unwrap_or_else(repositories::admins::full_permissions);

    let created = repositories::admins::create(
        state.db(),
        repositories::admins::CreateAdmin {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            email: &email,
            hashed_password,
            permissions,
            is_super_admin: false,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create admin"))?;

    Ok(Json(created.into()))
}

pub(crate) async fn update_permissions(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(admin_id): Path<String>,
    Json(payload): Json<PermissionsUpdate>,
) -> Result<Json<AdminResponse>, ApiError> {
    require_super_admin(&admin)?;

    let target = repositories::admins::find_by_id(state.db(), &admin_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load admin"))?
        .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;
    if target.is_super_admin {
        return Err(ApiError::Forbidden("Super admin permissions cannot be changed"));
    }

    repositories::admins::update_permissions(state.db(), &admin_id, payload.permissions)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update permissions"))?;

    let updated = repositories::admins::find_by_id(state.db(), &admin_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load admin"))?
        .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;
    Ok(Json(updated.into()))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(admin_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_super_admin(&admin)?;
    if admin.id == admin_id {
        return Err(ApiError::BadRequest("Cannot delete your own account".to_string()));
    }

    let deleted = repositories::admins::delete(state.db(), &admin_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete admin"))?;
    if !deleted {
        return Err(ApiError::NotFound("Admin not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}
