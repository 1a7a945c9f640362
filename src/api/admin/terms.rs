use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_permission, CurrentAdmin};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::admin::TermCreate;
use crate::schemas::subject::TermResponse;

pub(crate) async fn list(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
) -> Result<Json<Vec<TermResponse>>, ApiError> {
    require_permission(&admin, "subjects")?;
    let terms = repositories::terms::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list terms"))?;
    Ok(Json(terms.into_iter().map(TermResponse::from).collect()))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<TermCreate>,
) -> Result<Json<TermResponse>, ApiError> {
    require_permission(&admin, "subjects")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let name = payload.name.trim();
    let exists = repositories::terms::exists_by_name(state.db(), name)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check term name"))?;
    if exists {
        return Err(ApiError::Conflict("A term with this name already exists".to_string()));
    }

    let term =
        repositories::terms::create(state.db(), &Uuid::new_v4().to_string(), name, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create term"))?;
    Ok(Json(term.into()))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(term_id): Path<String>,
    Json(payload): Json<TermCreate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "subjects")?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let renamed = repositories::terms::rename(state.db(), &term_id, payload.name.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to rename term"))?;
    if !renamed {
        return Err(ApiError::NotFound("Term not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

pub(crate) async fn remove(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(term_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_permission(&admin, "subjects")?;

    let deleted = repositories::terms::delete(state.db(), &term_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete term"))?;
    if !deleted {
        return Err(ApiError::NotFound("Term not found".to_string()));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn duplicate_term_name_is_rejected() {
        let ctx = test_support::setup_test_context().await;
        let admin = test_support::insert_admin(
            ctx.state.db(),
            "Admin",
            "admin@madrasa.local",
            "admin-pass",
            true,
        )
        .await;
        let token = test_support::admin_token(&admin.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/admin/terms",
                Some(&token),
                Some(json!({"name": "First term"})),
            ))
            .await
            .expect("create term");
        let status = response.status();
        let created = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {created}");
        assert_eq!(created["name"], "First term");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/admin/terms",
                Some(&token),
                Some(json!({"name": "First term"})),
            ))
            .await
            .expect("duplicate term");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
