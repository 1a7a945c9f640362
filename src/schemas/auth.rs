use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::core::time::format_primitive;
use crate::db::models::{Admin, User};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LoginRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(custom(function = "validate_gmail"))]
    pub(crate) email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) user: UserResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminLoginRequest {
    #[validate(email(message = "invalid email"))]
    pub(crate) email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminLoginResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) admin: AdminResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) total_points: i64,
    pub(crate) registered_at: String,
    pub(crate) last_login: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            total_points: user.total_points,
            registered_at: format_primitive(user.registered_at),
            last_login: user.last_login.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) permissions: serde_json::Value,
    pub(crate) is_super_admin: bool,
    pub(crate) created_at: String,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            permissions: admin.permissions.0,
            is_super_admin: admin.is_super_admin,
            created_at: format_primitive(admin.created_at),
        }
    }
}

/// Accounts are Gmail-only by policy, checked on the raw address.
fn validate_gmail(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let Some((local, domain)) = email.rsplit_once('@') else {
        return Err(ValidationError::new("gmail_required"));
    };

    let local_ok = !local.is_empty()
        && local.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
        });

    if local_ok && domain.eq_ignore_ascii_case("gmail.com") {
        Ok(())
    } else {
        Err(ValidationError::new("gmail_required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_gmail_addresses() {
        assert!(validate_gmail("student.one+exams@gmail.com").is_ok());
        assert!(validate_gmail("Name@GMAIL.COM").is_ok());
    }

    #[test]
    fn rejects_other_domains_and_malformed_input() {
        assert!(validate_gmail("student@yahoo.com").is_err());
        assert!(validate_gmail("@gmail.com").is_err());
        assert!(validate_gmail("no-at-sign").is_err());
        assert!(validate_gmail("bad space@gmail.com").is_err());
    }
}
