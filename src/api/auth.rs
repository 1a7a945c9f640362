use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentUser, DeviceId};
use crate::core::security::{self, TokenAudience};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::auth::{LoginRequest, LoginResponse, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/login", post(login)).route("/me", get(me))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

/// Find-or-create on the (email, device) pair. The same email on a new
/// device registers a separate account.
async fn login(
    State(state): State<AppState>,
    DeviceId(device_id): DeviceId,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let email = payload.email.trim().to_lowercase();
    let name = payload.name.trim().to_string();
    let now = primitive_now_utc();

    let banned = repositories::blocked::is_banned(state.db(), &email, &device_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check ban list"))?;
    if banned {
        return Err(ApiError::Forbidden("This email or device has been banned"));
    }

    let existing = repositories::users::find_by_email_and_device(state.db(), &email, &device_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up user"))?;

    let user = match existing {
        Some(user) => {
            if user.is_blocked {
                return Err(ApiError::Forbidden("Your account has been blocked"));
            }
            repositories::users::touch_last_login(state.db(), &user.id, now)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to record login"))?;
            repositories::users::fetch_one_by_id(state.db(), &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        }
        None => repositories::users::create(
            state.db(),
            repositories::users::CreateUser {
                id: &Uuid::new_v4().to_string(),
                name: &name,
                email: &email,
                device_id: &device_id,
                registered_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create user"))?,
    };

    let access_token =
        security::create_access_token(&user.id, TokenAudience::Student, state.settings(), None)
            .map_err(|e| ApiError::internal(e, "Failed to issue access token"))?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: user.into(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::core::time::primitive_now_utc;
    use crate::repositories;
    use crate::test_support;

    fn login_request(email: &str, device_id: &str) -> Request<Body> {
        let body = json!({"name": "Test Student", "email": email});
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-device-id", device_id)
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn login_registers_then_reuses_account() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(login_request("student@gmail.com", "device-1"))
            .await
            .expect("first login");
        let status = response.status();
        let first = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {first}");
        let first_id = first["user"]["id"].as_str().expect("user id").to_string();
        assert_eq!(first["token_type"], "bearer");

        let response = ctx
            .app
            .clone()
            .oneshot(login_request("student@gmail.com", "device-1"))
            .await
            .expect("second login");
        let second = test_support::read_json(response).await;
        assert_eq!(second["user"]["id"], first_id.as_str());

        // Same email on another device registers a separate account.
        let response = ctx
            .app
            .clone()
            .oneshot(login_request("student@gmail.com", "device-2"))
            .await
            .expect("third login");
        let third = test_support::read_json(response).await;
        assert_ne!(third["user"]["id"], first_id.as_str());
    }

    #[tokio::test]
    async fn login_rejects_non_gmail_address() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(login_request("student@example.com", "device-1"))
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn banned_identity_cannot_login() {
        let ctx = test_support::setup_test_context().await;

        repositories::blocked::create(
            ctx.state.db(),
            repositories::blocked::CreateBlockedEntry {
                id: &Uuid::new_v4().to_string(),
                email: Some("banned@gmail.com"),
                device_id: None,
                reason: Some("spam"),
                blocked_by: None,
                blocked_at: primitive_now_utc(),
            },
        )
        .await
        .expect("insert ban");

        let response = ctx
            .app
            .clone()
            .oneshot(login_request("banned@gmail.com", "fresh-device"))
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
