use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::security::{self, TokenAudience};
use crate::core::state::AppState;
use crate::db::models::{Admin, User};
use crate::repositories;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) Admin);

/// Device identity sent by the client on every request that needs it.
pub(crate) struct DeviceId(pub(crate) String);

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = bearer_token(parts)?;
        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        if claims.aud != TokenAudience::Student {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if user.is_blocked {
            return Err(ApiError::Forbidden("Your account has been blocked"));
        }

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = bearer_token(parts)?;
        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        if claims.aud != TokenAudience::Admin {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        let admin = repositories::admins::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load admin"))?;

        admin.map(CurrentAdmin).ok_or(ApiError::Unauthorized("Admin not found"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for DeviceId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-device-id")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .map(|value| DeviceId(value.to_string()))
            .ok_or_else(|| ApiError::BadRequest("x-device-id header is required".to_string()))
    }
}

/// Super admins bypass the per-section permission map.
pub(crate) fn require_permission(admin: &Admin, section: &str) -> Result<(), ApiError> {
    if admin.is_super_admin {
        return Ok(());
    }

    let allowed =
        admin.permissions.0.get(section).and_then(|value| value.as_bool()).unwrap_or(false);

    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not enough permissions for this section"))
    }
}

pub(crate) fn require_super_admin(admin: &Admin) -> Result<(), ApiError> {
    if admin.is_super_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Super admin access required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use time::{Date, PrimitiveDateTime, Time};

    fn admin_with(permissions: serde_json::Value, is_super_admin: bool) -> Admin {
        let date = Date::from_calendar_date(2025, time::Month::January, 1).unwrap();
        Admin {
            id: "admin-1".into(),
            name: "Admin".into(),
            email: "admin@example.com".into(),
            hashed_password: "x".into(),
            permissions: Json(permissions),
            is_super_admin,
            created_at: PrimitiveDateTime::new(date, Time::MIDNIGHT),
        }
    }

    #[test]
    fn permission_map_is_checked_per_section() {
        let admin = admin_with(serde_json::json!({"subjects": true, "exams": false}), false);
        assert!(require_permission(&admin, "subjects").is_ok());
        assert!(require_permission(&admin, "exams").is_err());
        assert!(require_permission(&admin, "stats").is_err());
    }

    #[test]
    fn super_admin_bypasses_permission_map() {
        let admin = admin_with(serde_json::json!({}), true);
        assert!(require_permission(&admin, "anything").is_ok());
        assert!(require_super_admin(&admin).is_ok());
    }
}
