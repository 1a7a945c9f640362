use axum::extract::State;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::security::{self, TokenAudience};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::auth::{AdminLoginRequest, AdminLoginResponse};

pub(crate) async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let admin = repositories::admins::find_by_email(state.db(), payload.email.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up admin"))?
        .ok_or(ApiError::Unauthorized("Incorrect email or password"))?;

    let verified = security::verify_password(&payload.password, &admin.hashed_password)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    let access_token =
        security::create_access_token(&admin.id, TokenAudience::Admin, state.settings(), None)
            .map_err(|e| ApiError::internal(e, "Failed to issue access token"))?;

    Ok(Json(AdminLoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        admin: admin.into(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn login_verifies_password() {
        let ctx = test_support::setup_test_context().await;
        test_support::insert_admin(ctx.state.db(), "Admin", "admin@madrasa.local", "admin-pass", true)
            .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/admin/auth/login",
                None,
                Some(json!({"email": "admin@madrasa.local", "password": "wrong-pass"})),
            ))
            .await
            .expect("bad login");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/admin/auth/login",
                None,
                Some(json!({"email": "admin@madrasa.local", "password": "admin-pass"})),
            ))
            .await
            .expect("good login");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert!(body["access_token"].as_str().is_some());
        assert_eq!(body["admin"]["email"], "admin@madrasa.local");
    }

    #[tokio::test]
    async fn student_token_cannot_reach_admin_routes() {
        let ctx = test_support::setup_test_context().await;
        let user = test_support::insert_user(
            ctx.state.db(),
            "Student",
            "student@gmail.com",
            "device-1",
        )
        .await;
        let token = test_support::student_token(&user.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/admin/terms",
                Some(&token),
                None,
            ))
            .await
            .expect("list terms");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
