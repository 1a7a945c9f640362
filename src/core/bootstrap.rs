use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

pub(crate) async fn ensure_default_admin(state: &AppState) -> anyhow::Result<()> {
    let admin_settings = state.settings().admin();
    if admin_settings.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping default admin creation");
        return Ok(());
    }

    let email = &admin_settings.first_admin_email;
    let existing = repositories::admins::find_by_email(state.db(), email).await?;
    let now = primitive_now_utc();

    if let Some(admin) = existing {
        let password_matches =
            security::verify_password(&admin_settings.first_admin_password, &admin.hashed_password)
                .unwrap_or(false);

        if password_matches && admin.is_super_admin {
            tracing::info!("Default admin already up to date");
            return Ok(());
        }

        let hashed_password = if password_matches {
            admin.hashed_password.clone()
        } else {
            security::hash_password(&admin_settings.first_admin_password)?
        };

        sqlx::query(
            "UPDATE admins SET hashed_password = $1, is_super_admin = TRUE WHERE id = $2",
        )
        .bind(hashed_password)
        .bind(&admin.id)
        .execute(state.db())
        .await?;

        tracing::info!("Updated default admin {email}");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin_settings.first_admin_password)?;

    repositories::admins::create(
        state.db(),
        repositories::admins::CreateAdmin {
            id: &Uuid::new_v4().to_string(),
            name: "Super Admin",
            email,
            hashed_password,
            permissions: repositories::admins::full_permissions(),
            is_super_admin: true,
            created_at: now,
        },
    )
    .await?;

    tracing::info!("Created default admin {email}");
    Ok(())
}
